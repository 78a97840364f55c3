//! Java-like, stable renderings of types for diagnostics and test output.
//!
//! This is display only; nothing parses these strings back.

use std::fmt;

use crate::store::TypeEnv;
use crate::ty::{Type, WildcardBound};

pub struct TypeDisplay<'a> {
    env: &'a dyn TypeEnv,
    ty: &'a Type,
}

impl Type {
    pub fn display<'a>(&'a self, env: &'a dyn TypeEnv) -> TypeDisplay<'a> {
        TypeDisplay { env, ty: self }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_type(self.env, self.ty, f)
    }
}

fn class_name(env: &dyn TypeEnv, id: crate::ty::ClassId) -> String {
    env.class(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn fmt_type(env: &dyn TypeEnv, ty: &Type, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match ty {
        Type::Primitive(kind) => f.write_str(kind.name()),
        Type::Class(id) => f.write_str(&class_name(env, *id)),
        Type::Generic(g) => {
            f.write_str(&class_name(env, g.def))?;
            f.write_str("<")?;
            for (index, arg) in g.bindings.bound_types().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                fmt_type(env, arg, f)?;
            }
            f.write_str(">")
        }
        Type::Array(elem) => {
            fmt_type(env, elem, f)?;
            f.write_str("[]")
        }
        Type::Var(id) => match env.type_param(*id) {
            Some(def) => f.write_str(&def.name),
            None => write!(f, "{id}"),
        },
        Type::Captured(id) => match env.type_param(*id) {
            Some(def) => {
                f.write_str(&def.name)?;
                if let Some(wildcard) = &def.captured_from {
                    f.write_str(" of ")?;
                    fmt_wildcard(env, wildcard, f)?;
                }
                Ok(())
            }
            None => write!(f, "{id}"),
        },
        Type::Wildcard(bound) => fmt_wildcard(env, bound, f),
        Type::Intersection(i) => {
            let object = env.well_known().object;
            let skip_base =
                matches!(&i.base, Type::Class(id) if *id == object) && !i.interfaces.is_empty();
            let mut first = true;
            if !skip_base {
                fmt_type(env, &i.base, f)?;
                first = false;
            }
            for iface in &i.interfaces {
                if !first {
                    f.write_str(" & ")?;
                }
                fmt_type(env, iface, f)?;
                first = false;
            }
            Ok(())
        }
        Type::Bottom => f.write_str("<bottom>"),
        Type::Null => f.write_str("<null>"),
    }
}

fn fmt_wildcard(env: &dyn TypeEnv, bound: &WildcardBound, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match bound {
        WildcardBound::Unbounded => f.write_str("?"),
        WildcardBound::Extends(b) => {
            f.write_str("? extends ")?;
            fmt_type(env, b, f)
        }
        WildcardBound::Super(b) => {
            f.write_str("? super ")?;
            fmt_type(env, b, f)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{TypeEnv, TypeStore};
    use crate::ty::{make_generic, Type};

    #[test]
    fn renders_generic_array_and_wildcard_shapes() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();
        let string = Type::Class(wk.string);

        let list_ext_number = make_generic(
            &store,
            wk.list,
            vec![Type::extends_wildcard(Type::Class(wk.number))],
        )
        .unwrap();
        assert_eq!(
            list_ext_number.display(&store).to_string(),
            "java.util.List<? extends java.lang.Number>"
        );

        assert_eq!(
            Type::array(Type::int()).display(&store).to_string(),
            "int[]"
        );
        assert_eq!(string.display(&store).to_string(), "java.lang.String");
        assert_eq!(Type::Null.display(&store).to_string(), "<null>");
    }
}
