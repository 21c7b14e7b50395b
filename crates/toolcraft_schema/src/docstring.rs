//! Documentation block parsing.
//!
//! Recognised parameter sections:
//!
//! - rustdoc headings: `# Arguments`, `# Parameters`, `# Fields` with list items
//!   such as ``* `query` - The search text.``
//! - Google style: `Args:`, `Arguments:`, `Attributes:` with indented
//!   `name (type): description` entries
//! - reST fields: `:param name: description`
//! - numpydoc: `Parameters` underlined with dashes, `name : type` entries
//!
//! Other known sections (`# Errors`, `# Examples`, `Returns:`, `:raises:` ...)
//! are dropped. Everything else, other headings such as `# Notes` included, is
//! body text: the first paragraph is the summary, the rest the long
//! description.

use indexmap::IndexMap;

const PARAM_HEADINGS: &[&str] = &["Arguments", "Args", "Parameters", "Params", "Fields"];

const DROPPED_HEADINGS: &[&str] = &[
    "Returns", "Errors", "Panics", "Safety", "Examples", "Example",
];

const GOOGLE_PARAM_TITLES: &[&str] = &[
    "Args",
    "Arguments",
    "Attributes",
    "Parameters",
    "Params",
    "Keyword Args",
    "Fields",
];

const GOOGLE_OTHER_TITLES: &[&str] = &[
    "Returns", "Return", "Raises", "Yields", "Examples", "Example", "Note", "Notes", "Errors",
    "Panics", "Todo", "See Also", "Warning", "Warnings",
];

const NUMPY_PARAM_TITLES: &[&str] = &["Parameters", "Other Parameters", "Attributes", "Fields"];

/// A parsed documentation block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Docstring {
    summary: Option<String>,
    long_description: Option<String>,
    params: IndexMap<String, String>,
}

impl Docstring {
    /// Parses a documentation block.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut body: Vec<&str> = Vec::new();
        let mut params = IndexMap::new();
        let mut in_fence = false;
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim();

            if trimmed.starts_with("```") {
                in_fence = !in_fence;
                body.push(line);
                i += 1;
                continue;
            }
            if in_fence {
                body.push(line);
                i += 1;
                continue;
            }

            if let Some(heading) = markdown_heading(trimmed)
                && (PARAM_HEADINGS.contains(&heading) || DROPPED_HEADINGS.contains(&heading))
            {
                let end = next_markdown_heading(&lines, i + 1);
                if PARAM_HEADINGS.contains(&heading) {
                    collect(&mut params, list_entries(&lines[i + 1..end]));
                }
                i = end;
                continue;
            }

            if let Some(title) = google_title(trimmed) {
                let header_indent = indent_of(line);
                let mut end = i + 1;
                while end < lines.len()
                    && (lines[end].trim().is_empty() || indent_of(lines[end]) > header_indent)
                {
                    end += 1;
                }
                if GOOGLE_PARAM_TITLES.contains(&title) {
                    collect(
                        &mut params,
                        indented_entries(&lines[i + 1..end], google_entry),
                    );
                }
                i = end;
                continue;
            }

            if !trimmed.is_empty() && lines.get(i + 1).is_some_and(|next| is_underline(next)) {
                let mut end = i + 2;
                while end < lines.len()
                    && !(!lines[end].trim().is_empty()
                        && lines.get(end + 1).is_some_and(|next| is_underline(next)))
                {
                    end += 1;
                }
                if NUMPY_PARAM_TITLES.contains(&trimmed) {
                    collect(
                        &mut params,
                        indented_entries(&lines[i + 2..end], numpy_entry),
                    );
                }
                i = end;
                continue;
            }

            if let Some((kind, rest)) = rest_field(trimmed) {
                let field_indent = indent_of(line);
                let mut end = i + 1;
                let mut description = rest.trim().to_string();
                while end < lines.len()
                    && !lines[end].trim().is_empty()
                    && indent_of(lines[end]) > field_indent
                {
                    append(&mut description, lines[end].trim());
                    end += 1;
                }
                if let Some(name) = kind
                    .strip_prefix("param ")
                    .or_else(|| kind.strip_prefix("parameter "))
                    .or_else(|| kind.strip_prefix("arg "))
                    .and_then(|declaration| declaration.split_whitespace().last())
                {
                    params.insert(name.to_string(), description);
                }
                i = end;
                continue;
            }

            body.push(line);
            i += 1;
        }

        let (summary, long_description) = split_body(&body);
        Self {
            summary,
            long_description,
            params,
        }
    }

    /// The first paragraph, joined into one line.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Body text after the first paragraph, line breaks preserved.
    #[must_use]
    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    /// Description of one parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Documented parameters in the order they appear.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(name, description)| (name.as_str(), description.as_str()))
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn append(description: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !description.is_empty() {
        description.push(' ');
    }
    description.push_str(text);
}

fn collect(params: &mut IndexMap<String, String>, entries: Vec<(String, String)>) {
    for (name, description) in entries {
        params.insert(name, description);
    }
}

fn markdown_heading(trimmed: &str) -> Option<&str> {
    let rest = trimmed.trim_start_matches('#');
    if rest.len() == trimmed.len() || !rest.starts_with(' ') {
        return None;
    }
    Some(rest.trim())
}

fn next_markdown_heading(lines: &[&str], from: usize) -> usize {
    let mut in_fence = false;
    for (offset, line) in lines[from..].iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
        } else if !in_fence && markdown_heading(trimmed).is_some() {
            return from + offset;
        }
    }
    lines.len()
}

fn google_title(trimmed: &str) -> Option<&str> {
    let title = trimmed.strip_suffix(':')?;
    (GOOGLE_PARAM_TITLES.contains(&title) || GOOGLE_OTHER_TITLES.contains(&title)).then_some(title)
}

fn is_underline(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}

/// Splits `:kind: rest` into its parts.
fn rest_field(trimmed: &str) -> Option<(&str, &str)> {
    let inner = trimmed.strip_prefix(':')?;
    let (kind, rest) = inner.split_once(':')?;
    let known = ["param", "parameter", "arg", "type", "returns", "return", "rtype", "raises", "raise"];
    let head = kind.split_whitespace().next()?;
    known.contains(&head).then_some((kind.trim(), rest))
}

/// Parses markdown list items, folding continuation lines into the previous item.
fn list_entries(lines: &[&str]) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let item = trimmed
            .strip_prefix("* ")
            .or_else(|| trimmed.strip_prefix("- "))
            .or_else(|| trimmed.strip_prefix("+ "));
        match item {
            Some(item) => {
                if let Some(entry) = list_entry(item) {
                    entries.push(entry);
                }
            }
            None => {
                if let Some((_, description)) = entries.last_mut() {
                    append(description, trimmed);
                }
            }
        }
    }
    entries
}

fn list_entry(item: &str) -> Option<(String, String)> {
    let (name, rest) = if let Some(quoted) = item.strip_prefix('`') {
        quoted.split_once('`')?
    } else {
        let end = item
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(item.len());
        item.split_at(end)
    };
    if name.is_empty() {
        return None;
    }
    let rest = skip_type(rest.trim_start());
    let description = rest
        .trim_start_matches(|c: char| c == '-' || c == ':' || c == '\u{2013}' || c.is_whitespace())
        .trim();
    Some((name.to_string(), description.to_string()))
}

/// Drops a leading `(type)` annotation.
fn skip_type(rest: &str) -> &str {
    if rest.starts_with('(')
        && let Some(close) = rest.find(')')
    {
        return rest[close + 1..].trim_start();
    }
    rest
}

/// Parses entries whose first line sits at the section's base indentation and
/// whose continuation lines are indented deeper.
fn indented_entries(
    lines: &[&str],
    parse_entry: fn(&str) -> Option<(String, String)>,
) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();
    let Some(base) = lines
        .iter()
        .find(|line| !line.trim().is_empty())
        .map(|line| indent_of(line))
    else {
        return entries;
    };

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if indent_of(line) <= base {
            if let Some(entry) = parse_entry(trimmed) {
                entries.push(entry);
            }
        } else if let Some((_, description)) = entries.last_mut() {
            append(description, trimmed);
        }
    }
    entries
}

/// `name (type): description` or `name: description`.
fn google_entry(trimmed: &str) -> Option<(String, String)> {
    let end = trimmed
        .find(|c: char| c == ':' || c == '(' || c.is_whitespace())
        .unwrap_or(trimmed.len());
    let (name, rest) = trimmed.split_at(end);
    let name = name.trim_start_matches('*');
    if name.is_empty() {
        return None;
    }
    let rest = skip_type(rest.trim_start());
    let description = rest.strip_prefix(':').unwrap_or(rest).trim();
    Some((name.to_string(), description.to_string()))
}

/// `name : type` with the description on following lines.
fn numpy_entry(trimmed: &str) -> Option<(String, String)> {
    let name = trimmed.split(':').next()?.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name.to_string(), String::new()))
}

fn split_body(body: &[&str]) -> (Option<String>, Option<String>) {
    let mut lines = body.iter().map(|line| line.trim_end()).skip_while(|line| line.is_empty());

    let mut summary = String::new();
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        append(&mut summary, line.trim());
    }

    let mut rest: Vec<&str> = lines.skip_while(|line| line.is_empty()).collect();
    while rest.last().is_some_and(|line| line.is_empty()) {
        rest.pop();
    }

    let summary = (!summary.is_empty()).then_some(summary);
    let long = (!rest.is_empty()).then(|| rest.join("\n"));
    (summary, long)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rustdoc_arguments() {
        let doc = Docstring::parse(
            "Searches the index.\n\
             \n\
             Results are ranked by relevance.\n\
             \n\
             # Arguments\n\
             \n\
             * `query` - The search text.\n\
             * `limit` - Maximum number of hits,\n\
             \x20 counted after deduplication.\n\
             \n\
             # Errors\n\
             \n\
             Fails when the index is closed.",
        );

        assert_eq!(doc.summary(), Some("Searches the index."));
        assert_eq!(doc.long_description(), Some("Results are ranked by relevance."));
        assert_eq!(doc.param("query"), Some("The search text."));
        assert_eq!(
            doc.param("limit"),
            Some("Maximum number of hits, counted after deduplication.")
        );
    }

    #[test]
    fn google_args() {
        let doc = Docstring::parse(
            "Get the weather.\n\nArgs:\n    city (str): City name.\n    units: Either metric\n        or imperial.\n\nReturns:\n    A report.",
        );

        assert_eq!(doc.summary(), Some("Get the weather."));
        assert_eq!(doc.long_description(), None);
        assert_eq!(doc.param("city"), Some("City name."));
        assert_eq!(doc.param("units"), Some("Either metric or imperial."));
        assert_eq!(doc.params().count(), 2);
    }

    #[test]
    fn rest_fields() {
        let doc = Docstring::parse(
            "Add numbers.\n\n:param a: First operand.\n:param int b: Second operand.\n:returns: The sum.",
        );

        assert_eq!(doc.param("a"), Some("First operand."));
        assert_eq!(doc.param("b"), Some("Second operand."));
        assert_eq!(doc.long_description(), None);
    }

    #[test]
    fn numpydoc_parameters() {
        let doc = Docstring::parse(
            "Scale a vector.\n\nParameters\n----------\nfactor : float\n    Multiplier applied\n    to every element.\n\nReturns\n-------\nlist\n    The scaled vector.",
        );

        assert_eq!(doc.param("factor"), Some("Multiplier applied to every element."));
        assert!(doc.param("list").is_none());
    }

    #[test]
    fn multi_line_summary_and_code_fence() {
        let doc = Docstring::parse(
            "Runs a query\nagainst the store.\n\n```\n# not a heading\n```",
        );

        assert_eq!(doc.summary(), Some("Runs a query against the store."));
        assert_eq!(doc.long_description(), Some("```\n# not a heading\n```"));
    }

    #[test]
    fn unknown_headings_stay_in_the_description() {
        let doc = Docstring::parse(
            "Resize an image.\n\n\
             # Notes\n\n\
             Aspect ratio is preserved.\n\n\
             # Errors\n\n\
             Fails on empty images.\n\n\
             # Arguments\n\n\
             * `width` - Target width.",
        );
        assert_eq!(
            doc.long_description(),
            Some("# Notes\n\nAspect ratio is preserved.")
        );
        assert_eq!(doc.param("width"), Some("Target width."));
    }

    #[test]
    fn empty_doc() {
        let doc = Docstring::parse("");
        assert_eq!(doc, Docstring::default());
    }
}
