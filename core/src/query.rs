//! Dotted-path query resolution (spec §6, §9 "variadic query path").
//!
//! `query_resolve_context(parent, "a.b@2.c")` walks a dotted name with an
//! optional `@index` disambiguator per segment (0 when omitted), rather
//! than exposing a varargs-style interface.

use crate::context::Context;
use crate::error::{bail, MoldError, Result, Status};

/// `query_resolve_context(parent, path)`.
pub fn query_resolve_context(parent: &Context, path: &str) -> Result<Context> {
    if path.is_empty() {
        bail!(Status::InvalidArgument, "empty query path");
    }
    let mut current = parent.clone();
    for segment in path.split('.') {
        let (name, index) = split_segment(segment)?;
        current = current.find_element(name, index)?;
    }
    Ok(current)
}

fn split_segment(segment: &str) -> Result<(&str, usize)> {
    match segment.split_once('@') {
        Some((name, idx)) => {
            let index: usize = idx
                .parse()
                .map_err(|_| MoldError::new(Status::InvalidArgument, format!("invalid index in '{segment}'")))?;
            Ok((name, index))
        }
        None => Ok((segment, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{self, payload::ContextKind};

    #[test]
    fn resolves_dotted_path_with_index() {
        let mold = context::mold_begin();
        let a = context::begin(&mold, ContextKind::Section).unwrap();
        a.set_name("a").unwrap();
        let b0 = context::begin(&a, ContextKind::Section).unwrap();
        b0.set_name("b").unwrap();
        let b1 = context::begin(&a, ContextKind::Section).unwrap();
        b1.set_name("b").unwrap();
        let c = context::begin(&b1, ContextKind::Keyval).unwrap();
        c.set_name("c").unwrap();
        let default = context::begin(&c, ContextKind::Default).unwrap();
        context::finalize(&default).unwrap();

        context::finalize(&c).unwrap();
        context::finalize(&b0).unwrap();
        context::finalize(&b1).unwrap();
        context::finalize(&a).unwrap();

        let found = query_resolve_context(&mold, "a.b@1.c").unwrap();
        assert_eq!(found, c);
    }

    #[test]
    fn missing_segment_is_not_exist() {
        let mold = context::mold_begin();
        let a = context::begin(&mold, ContextKind::Section).unwrap();
        a.set_name("a").unwrap();
        context::finalize(&a).unwrap();

        let err = query_resolve_context(&mold, "a.missing").unwrap_err();
        assert_eq!(err.status, Status::NotExist);
    }
}
