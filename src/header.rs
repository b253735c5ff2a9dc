//! Leaf and rule file headers.
//!
//! Every generated script file starts with a block of `#` comment lines
//! carrying `# TAG: value` metadata. Parsing stops at the first line that is
//! not a comment; everything after that point is the executable body and is
//! passed through verbatim to the host's scripting facility.

/// Recognized header tags.
const NAME_TAG: &str = "NAME";
const TEXT_COLOR_TAG: &str = "TEXTCOLOR";
const BACKGROUND_COLOR_TAG: &str = "COLOR";
const IGNORE_CLASSES_TAG: &str = "IGNORE CLASSES";

const BANNER: &str =
    "#----------------------------------------------------------------------------------------------------------";

/// Structured view of a leaf or rule header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub name: Option<String>,
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    /// Set by `# IGNORE CLASSES: 1`; only meaningful on rule scripts.
    pub ignore_classes: bool,
}

impl Header {
    pub fn with_name(name: impl Into<String>) -> Self {
        Header {
            name: Some(name.into()),
            ..Header::default()
        }
    }

    /// Parse the leading comment lines of `source`.
    pub fn parse(source: &str) -> Header {
        let mut header = Header::default();

        for line in source.lines() {
            if !line.starts_with('#') {
                break;
            }
            if let Some(value) = tag_value(line, NAME_TAG) {
                header.name.get_or_insert_with(|| value.to_string());
            } else if let Some(value) = tag_value(line, TEXT_COLOR_TAG) {
                header.text_color.get_or_insert_with(|| value.to_string());
            } else if let Some(value) = tag_value(line, BACKGROUND_COLOR_TAG) {
                header
                    .background_color
                    .get_or_insert_with(|| value.to_string());
            } else if let Some(value) = tag_value(line, IGNORE_CLASSES_TAG) {
                header.ignore_classes = value.trim() == "1";
            }
        }

        header
    }

    /// Render the header block that is written at the top of generated files.
    pub fn render(&self) -> String {
        let mut lines = vec![BANNER.to_string(), "#".to_string()];
        lines.push("# AUTOMATICALLY GENERATED FILE, MANAGED BY THE HOTBOX".to_string());
        lines.push("#".to_string());

        if let Some(name) = &self.name {
            lines.push(format!("# {}: {}", NAME_TAG, name));
        }
        if let Some(color) = &self.text_color {
            lines.push(format!("# {}: {}", TEXT_COLOR_TAG, color));
        }
        if let Some(color) = &self.background_color {
            lines.push(format!("# {}: {}", BACKGROUND_COLOR_TAG, color));
        }
        if self.ignore_classes {
            lines.push(format!("# {}: 1", IGNORE_CLASSES_TAG));
        }

        lines.push("#".to_string());
        lines.push(BANNER.to_string());
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Extract the value of a `# TAG: value` line, if `line` carries that tag.
fn tag_value<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix("# ")?;
    let value = rest.strip_prefix(tag)?.strip_prefix(": ")?;
    Some(value.trim_end_matches(['\r', '\n']))
}

/// The executable body of a script file: everything from the first
/// non-comment line onwards.
pub fn body_of(source: &str) -> &str {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        if !line.starts_with('#') {
            return &source[offset..];
        }
        offset += line.len();
    }
    ""
}
