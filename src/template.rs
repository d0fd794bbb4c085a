//! Logic-less templates rendered against JSON data.

use serde_json::Value;

use crate::error::TemplateError;

pub trait TemplateRenderer: Send {
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError>;
}

/// A mustache subset: variables (escaped and raw), dotted names, `{{.}}`,
/// sections, inverted sections and comments. Partials, lambdas and custom
/// delimiters are not supported.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mustache;

impl TemplateRenderer for Mustache {
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        let tokens = parse(template)?;
        let mut out = String::with_capacity(template.len());
        let mut stack = vec![data];
        render_tokens(&tokens, &mut stack, &mut out);
        Ok(out)
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Text(String),
    Variable { name: String, escape: bool },
    Section {
        name: String,
        inverted: bool,
        children: Vec<Token>,
    },
}

struct OpenSection {
    name: String,
    inverted: bool,
    tokens: Vec<Token>,
}

fn parse(template: &str) -> Result<Vec<Token>, TemplateError> {
    let mut open: Vec<OpenSection> = Vec::new();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(found) = template[pos..].find("{{") {
        let start = pos + found;
        let current = open.last_mut().map_or(&mut tokens, |section| &mut section.tokens);
        if start > pos {
            current.push(Token::Text(template[pos..start].to_string()));
        }

        let (tag, end) = if template[start..].starts_with("{{{") {
            let close = template[start + 3..]
                .find("}}}")
                .ok_or(TemplateError::UnterminatedTag(start))?;
            let inner = &template[start + 3..start + 3 + close];
            (format!("&{inner}"), start + 3 + close + 3)
        } else {
            let close = template[start + 2..]
                .find("}}")
                .ok_or(TemplateError::UnterminatedTag(start))?;
            let inner = &template[start + 2..start + 2 + close];
            (inner.to_string(), start + 2 + close + 2)
        };
        pos = end;

        let tag = tag.trim();
        let mut chars = tag.chars();
        let sigil = chars.next();
        let name = chars.as_str().trim().to_string();
        match sigil {
            Some('!') => {}
            Some('#') | Some('^') => open.push(OpenSection {
                name,
                inverted: sigil == Some('^'),
                tokens: Vec::new(),
            }),
            Some('/') => {
                let Some(section) = open.pop() else {
                    return Err(TemplateError::MismatchedSection {
                        expected: String::new(),
                        found: name,
                    });
                };
                if section.name != name {
                    return Err(TemplateError::MismatchedSection {
                        expected: section.name,
                        found: name,
                    });
                }
                let parent = open.last_mut().map_or(&mut tokens, |parent| &mut parent.tokens);
                parent.push(Token::Section {
                    name: section.name,
                    inverted: section.inverted,
                    children: section.tokens,
                });
            }
            Some('&') => {
                let current = open.last_mut().map_or(&mut tokens, |section| &mut section.tokens);
                current.push(Token::Variable {
                    name,
                    escape: false,
                });
            }
            _ => {
                let current = open.last_mut().map_or(&mut tokens, |section| &mut section.tokens);
                current.push(Token::Variable {
                    name: tag.to_string(),
                    escape: true,
                });
            }
        }
    }

    if let Some(section) = open.pop() {
        return Err(TemplateError::UnclosedSection(section.name));
    }
    if pos < template.len() {
        tokens.push(Token::Text(template[pos..].to_string()));
    }
    Ok(tokens)
}

fn render_tokens<'a>(tokens: &'a [Token], stack: &mut Vec<&'a Value>, out: &mut String) {
    for token in tokens {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Variable { name, escape } => {
                let Some(value) = lookup(stack, name) else {
                    continue;
                };
                let text = value_text(value);
                if *escape {
                    escape_html(&text, out);
                } else {
                    out.push_str(&text);
                }
            }
            Token::Section {
                name,
                inverted,
                children,
            } => {
                let value = lookup(stack, name);
                let truthy = value.is_some_and(is_truthy);
                if *inverted {
                    if !truthy {
                        render_tokens(children, stack, out);
                    }
                    continue;
                }
                let Some(value) = value.filter(|value| is_truthy(value)) else {
                    continue;
                };
                match value {
                    Value::Array(items) => {
                        for item in items {
                            stack.push(item);
                            render_tokens(children, stack, out);
                            stack.pop();
                        }
                    }
                    Value::Object(_) => {
                        stack.push(value);
                        render_tokens(children, stack, out);
                        stack.pop();
                    }
                    _ => render_tokens(children, stack, out),
                }
            }
        }
    }
}

fn lookup<'a>(stack: &[&'a Value], name: &str) -> Option<&'a Value> {
    if name == "." {
        return stack.last().copied();
    }
    let mut parts = name.split('.');
    let first = parts.next()?;
    let mut value = stack
        .iter()
        .rev()
        .find_map(|frame| frame.as_object().and_then(|map| map.get(first)))?;
    for part in parts {
        value = value.get(part)?;
    }
    Some(value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Number(_) | Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn escape_html(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn render(template: &str, data: Value) -> Result<String, TemplateError> {
        Mustache.render(template, &data)
    }

    #[test]
    fn substitutes_variables_and_dotted_names() {
        let data = json!({ "name": "Ada", "address": { "city": "London" } });
        assert_eq!(
            render("{{name}} lives in {{ address.city }}.", data).unwrap(),
            "Ada lives in London."
        );
    }

    #[test]
    fn missing_values_render_empty() {
        assert_eq!(render("[{{missing}}]", json!({})).unwrap(), "[]");
    }

    #[test]
    fn escapes_unless_raw() {
        let data = json!({ "html": "<b>&</b>" });
        assert_eq!(
            render("{{html}}|{{{html}}}|{{& html}}", data).unwrap(),
            "&lt;b&gt;&amp;&lt;/b&gt;|<b>&</b>|<b>&</b>"
        );
    }

    #[test]
    fn sections_iterate_lists() {
        let data = json!({ "items": [{ "n": 1 }, { "n": 2 }], "tags": ["a", "b"] });
        assert_eq!(
            render("{{#items}}<{{n}}>{{/items}} {{#tags}}{{.}};{{/tags}}", data).unwrap(),
            "<1><2> a;b;"
        );
    }

    #[test]
    fn sections_respect_truthiness() {
        let data = json!({ "yes": true, "no": false, "empty": [], "user": { "name": "Bo" } });
        assert_eq!(
            render(
                "{{#yes}}Y{{/yes}}{{#no}}N{{/no}}{{#empty}}E{{/empty}}{{#user}}{{name}}{{/user}}",
                data
            )
            .unwrap(),
            "YBo"
        );
    }

    #[test]
    fn inverted_sections_render_on_falsy() {
        let data = json!({ "items": [] });
        assert_eq!(
            render("{{^items}}none{{/items}}{{^missing}}!{{/missing}}", data).unwrap(),
            "none!"
        );
    }

    #[test]
    fn nested_sections_see_outer_context() {
        let data = json!({ "sep": ",", "items": [{ "n": 1 }, { "n": 2 }] });
        assert_eq!(
            render("{{#items}}{{n}}{{sep}}{{/items}}", data).unwrap(),
            "1,2,"
        );
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(render("a{{! note }}b", json!({})).unwrap(), "ab");
    }

    #[test]
    fn non_string_values_are_formatted() {
        let data = json!({ "n": 42, "f": 1.5, "b": false });
        assert_eq!(render("{{n}} {{f}} {{b}}", data).unwrap(), "42 1.5 false");
    }

    #[test]
    fn composite_values_interpolate_as_json() {
        let data = json!({ "items": [1, 2], "user": { "a": 1 }, "flag": false, "empty": "" });
        assert_eq!(
            render("{{items}} {{{user}}} {{^flag}}{{flag}}{{/flag}}{{^empty}}!{{/empty}}", data)
                .unwrap(),
            r#"[1,2] {"a":1} false!"#
        );
    }

    #[test]
    fn unbalanced_tags_are_errors() {
        assert_eq!(
            render("{{#a}}x", json!({})),
            Err(TemplateError::UnclosedSection("a".into()))
        );
        assert_eq!(
            render("{{#a}}x{{/b}}", json!({})),
            Err(TemplateError::MismatchedSection {
                expected: "a".into(),
                found: "b".into()
            })
        );
        assert_eq!(
            render("abc {{oops", json!({})),
            Err(TemplateError::UnterminatedTag(4))
        );
    }
}
