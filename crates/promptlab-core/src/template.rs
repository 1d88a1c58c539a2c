// ABOUTME: Variable substitution engine for {{name}} placeholders in prompt templates.
// ABOUTME: Extracts placeholders in first-seen order and substitutes values in a single pass.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

/// Placeholder identifier to substituted value.
pub type Variables = BTreeMap<String, String>;

/// Scan left to right for `{{`, a non-empty run of non-`}` characters, then
/// `}}`, and return each span's trimmed identifier.
fn placeholder_names(template: &str) -> Vec<&str> {
    let bytes = template.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            let inner_start = i + 2;
            let inner_len = bytes[inner_start..]
                .iter()
                .take_while(|&&b| b != b'}')
                .count();
            let inner_end = inner_start + inner_len;

            if inner_len > 0 && template[inner_end..].starts_with("}}") {
                found.push(template[inner_start..inner_end].trim());
                i = inner_end + 2;
                continue;
            }
        }
        i += 1;
    }

    found
}

/// Distinct placeholder identifiers in order of first appearance.
/// Whitespace-only placeholders (`{{ }}`) are not variables.
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    placeholder_names(template)
        .into_iter()
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(String::from)
        .collect()
}

/// Replace every `{{ key }}` whose key is in `variables`, trying a match at
/// every `{{` so braces around a placeholder (`{{{name}}}`) or an unclosed
/// `{{` before it never hide it. Unknown placeholders stay literal. Inserted
/// values are never rescanned, so a value containing `{{other}}` comes
/// through verbatim.
pub fn substitute(template: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut cursor = 0;
    let mut i = 0;

    while i < template.len() {
        let rest = &template[i..];
        if rest.starts_with("{{") {
            if let Some((len, value)) = match_placeholder(rest, variables) {
                out.push_str(&template[cursor..i]);
                out.push_str(value);
                i += len;
                cursor = i;
                continue;
            }
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }

    out.push_str(&template[cursor..]);
    out
}

/// Byte length of the `{{ key }}` span opening `rest`, with the value of the
/// supplied key it names.
fn match_placeholder<'v>(rest: &str, variables: &'v Variables) -> Option<(usize, &'v str)> {
    let body = rest[2..].trim_start();
    variables
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .find_map(|(key, value)| {
            let tail = body
                .strip_prefix(key.as_str())?
                .trim_start()
                .strip_prefix("}}")?;
            Some((rest.len() - tail.len(), value.as_str()))
        })
}

/// Render a JSON value the way it should appear inside a prompt.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Coerce a JSON object of caller-supplied variables into string values.
pub fn coerce_variables(raw: &Map<String, Value>) -> Variables {
    raw.iter()
        .map(|(k, v)| (k.clone(), value_to_string(v)))
        .collect()
}

/// Sorted union of the keys across a dataset's item records.
pub fn dataset_variables<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    items
        .into_iter()
        .flat_map(|item| item.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Layer manually entered values over a dataset item's values. A manual value
/// only wins when it is not blank, so clearing a field falls back to the dataset.
pub fn merge_variables(dataset_item: Option<&Map<String, Value>>, manual: &Variables) -> Variables {
    let mut merged = dataset_item.map(coerce_variables).unwrap_or_default();
    for (key, value) in manual {
        if !value.trim().is_empty() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn extract_preserves_first_seen_order_and_dedupes() {
        assert_eq!(extract_variables("{{b}} and {{a}} and {{b}}"), vec!["b", "a"]);
    }

    #[test]
    fn extract_trims_whitespace() {
        assert_eq!(
            extract_variables("Hello {{ name }}, meet {{name}} and {{  friend\t}}"),
            vec!["name", "friend"]
        );
    }

    #[test]
    fn extract_ignores_unclosed_and_empty_spans() {
        assert!(extract_variables("no vars here").is_empty());
        assert!(extract_variables("{{}} {{ }} {{open").is_empty());
        assert_eq!(extract_variables("{single} {{double}}"), vec!["double"]);
    }

    #[test]
    fn extract_is_idempotent_on_its_output() {
        let first = extract_variables("{{x}} {{y}} {{x}} {{z}}");
        let rebuilt: String = first.iter().map(|v| format!("{{{{{}}}}}", v)).collect();
        assert_eq!(extract_variables(&rebuilt), first);
    }

    #[test]
    fn extract_handles_multibyte_text() {
        assert_eq!(
            extract_variables("héllo {{ nom }} — {{ ville }}"),
            vec!["nom", "ville"]
        );
    }

    #[test]
    fn substitute_leaves_unmatched_placeholders() {
        assert_eq!(
            substitute("Hi {{name}}, {{other}}", &vars(&[("name", "Bo")])),
            "Hi Bo, {{other}}"
        );
    }

    #[test]
    fn substitute_tolerates_whitespace_and_repeats() {
        assert_eq!(
            substitute("{{ a }}-{{a}}-{{a  }}", &vars(&[("a", "1")])),
            "1-1-1"
        );
    }

    #[test]
    fn substitute_ignores_keys_not_in_template() {
        assert_eq!(
            substitute("plain", &vars(&[("unused", "x")])),
            "plain"
        );
    }

    #[test]
    fn substitute_finds_placeholders_inside_extra_braces() {
        let bo = vars(&[("name", "Bo")]);
        assert_eq!(substitute("{{{name}}}", &bo), "{Bo}");
        assert_eq!(substitute("{{ {{name}}", &bo), "{{ Bo");
        assert_eq!(substitute(r#"{"k": {{{name}}}}"#, &bo), r#"{"k": {Bo}}"#);
    }

    #[test]
    fn substitute_keeps_multibyte_text_around_placeholders() {
        assert_eq!(
            substitute("héllo {{ nom }} — {{ville}}", &vars(&[("nom", "Zoé")])),
            "héllo Zoé — {{ville}}"
        );
    }

    #[test]
    fn substitute_is_single_pass() {
        let out = substitute(
            "{{a}} then {{b}}",
            &vars(&[("a", "{{b}}"), ("b", "B")]),
        );
        assert_eq!(out, "{{b}} then B");
    }

    #[test]
    fn coerce_renders_non_string_values() {
        let raw = json!({"n": 3, "flag": true, "s": "text", "nothing": null})
            .as_object()
            .cloned()
            .unwrap();
        let coerced = coerce_variables(&raw);

        assert_eq!(coerced["n"], "3");
        assert_eq!(coerced["flag"], "true");
        assert_eq!(coerced["s"], "text");
        assert_eq!(coerced["nothing"], "");
    }

    #[test]
    fn dataset_variables_are_sorted_union() {
        let a = json!({"question": "q", "context": "c"}).as_object().cloned().unwrap();
        let b = json!({"answer": "x", "question": "q2"}).as_object().cloned().unwrap();

        assert_eq!(
            dataset_variables([&a, &b]),
            vec!["answer", "context", "question"]
        );
    }

    #[test]
    fn manual_values_override_dataset_only_when_not_blank() {
        let item = json!({"topic": "rust", "tone": "formal"})
            .as_object()
            .cloned()
            .unwrap();
        let manual = vars(&[("topic", "  "), ("tone", "casual"), ("extra", "yes")]);

        let merged = merge_variables(Some(&item), &manual);
        assert_eq!(merged["topic"], "rust");
        assert_eq!(merged["tone"], "casual");
        assert_eq!(merged["extra"], "yes");
    }
}
