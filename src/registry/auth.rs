// ABOUTME: WWW-Authenticate challenge parsing for registry logins.
// ABOUTME: Understands the Basic and Bearer schemes used by the registry v2 API.

use std::collections::HashMap;

/// An authentication challenge returned with a 401 from `/v2/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic,
    Bearer {
        realm: String,
        service: Option<String>,
    },
}

impl Challenge {
    /// Parse a `WWW-Authenticate` header value.
    ///
    /// Returns `None` for unknown schemes or a Bearer challenge without a realm.
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, rest) = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) => (scheme, rest),
            None => (header, ""),
        };

        if scheme.eq_ignore_ascii_case("basic") {
            return Some(Challenge::Basic);
        }

        if scheme.eq_ignore_ascii_case("bearer") {
            let mut params = parse_params(rest);
            let realm = params.remove("realm")?;
            let service = params.remove("service");
            return Some(Challenge::Bearer { realm, service });
        }

        None
    }
}

/// Split `key="value", key2=value2` into a map. Commas inside quotes are kept.
fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| *c == ',' || c.is_whitespace()) {
            chars.next();
        }

        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
        } else {
            while let Some(c) = chars.peek() {
                if *c == ',' {
                    break;
                }
                value.push(*c);
                chars.next();
            }
            value = value.trim_end().to_string();
        }

        params.insert(key.trim().to_ascii_lowercase(), value);
    }

    params
}

/// Find the `rel="next"` target in a `Link` header, if any.
pub(crate) fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(target.to_string())
    })
}
