use std::collections::BTreeMap;

/// Song metadata available to text overlay templates.
///
/// Keys are lower-cased. The pipeline adds `filename`, `stem` and `duration` alongside the
/// container tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AudioTags {
    values: BTreeMap<String, String>,
}

impl AudioTags {
    /// Normalize raw ffprobe tags.
    pub fn from_raw(raw: BTreeMap<String, String>) -> Self {
        let mut out = Self::default();
        for (k, v) in raw {
            out.insert(&k, v);
        }
        out
    }

    /// Set `key` (case-insensitive).
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_ascii_lowercase(), value.into());
    }

    /// Value of `key` (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Replace `{key}` placeholders. Unknown keys expand to an empty string; `{{` and `}}` are
    /// literal braces.
    pub fn fill_template(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if tail.starts_with("{{") || tail.starts_with("}}") {
                out.push_str(&tail[..1]);
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with('}') {
                out.push('}');
                rest = &tail[1..];
                continue;
            }
            match tail.find('}') {
                Some(close) => {
                    let key = tail[1..close].trim();
                    out.push_str(self.get(key).unwrap_or(""));
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/tags.rs"]
mod tests;
