use crate::sources::SimpleCss;

/// Fold simple class rules and the free-form CSS into one stylesheet.
///
/// Each class renders as `.class { decl1 decl2 }`, one rule per line in map
/// order, and the free-form text follows on its own line.
pub fn aggregate_styles(simple: &SimpleCss, generic: &str) -> String {
    let rules: Vec<String> = simple
        .iter()
        .map(|(class, declarations)| format!(".{} {{ {} }}", class, declarations.join(" ")))
        .collect();

    format!("{}\n{}", rules.join("\n"), generic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_then_generic() {
        let mut simple = SimpleCss::new();
        simple.insert(
            "metal".to_string(),
            vec!["color: red;".to_string(), "font-weight: bold;".to_string()],
        );
        simple.insert("punk".to_string(), vec!["color: green;".to_string()]);

        let css = aggregate_styles(&simple, "svg { background: #000; }");
        assert_eq!(
            css,
            ".metal { color: red; font-weight: bold; }\n.punk { color: green; }\nsvg { background: #000; }"
        );
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut simple = SimpleCss::new();
        simple.insert("zeta".to_string(), vec!["a: b;".to_string()]);
        simple.insert("alpha".to_string(), vec!["c: d;".to_string()]);
        let css = aggregate_styles(&simple, "");
        assert!(css.starts_with(".zeta"));
        assert!(css.contains("\n.alpha"));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(aggregate_styles(&SimpleCss::new(), ""), "\n");
        assert_eq!(aggregate_styles(&SimpleCss::new(), "body {}"), "\nbody {}");
    }
}
