use crate::{error::TemplateError, query::page::PageRequest};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Limit,
    Offset,
}

/// A query with `%(limit)s` and `%(offset)s` placeholders, substituted once per page.
///
/// Placeholders follow Python `%`-formatting: `%(name)s` or `%(name)d`, and
/// `%%` stands for a literal percent sign. Any other use of `%` is rejected
/// when the template is parsed, so rendering itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    segments: Vec<Segment>,
}

impl QueryTemplate {
    pub const LIMIT: &'static str = "limit";
    pub const OFFSET: &'static str = "offset";

    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut buf = String::new();
        let mut chars = text.char_indices();

        while let Some((pos, c)) = chars.next() {
            if c != '%' {
                buf.push(c);
                continue;
            }

            match chars.next() {
                Some((_, '%')) => buf.push('%'),
                Some((_, '(')) => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == ')' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Malformed {
                            position: pos,
                            reason: "unterminated placeholder name".into(),
                        });
                    }

                    match chars.next() {
                        Some((_, 's' | 'd')) => {}
                        Some((_, other)) => {
                            return Err(TemplateError::Malformed {
                                position: pos,
                                reason: format!("unsupported conversion '{other}'"),
                            });
                        }
                        None => {
                            return Err(TemplateError::Malformed {
                                position: pos,
                                reason: "placeholder without conversion".into(),
                            });
                        }
                    }

                    let segment = match name.as_str() {
                        Self::LIMIT => Segment::Limit,
                        Self::OFFSET => Segment::Offset,
                        _ => {
                            return Err(TemplateError::UnknownPlaceholder {
                                name,
                                position: pos,
                            });
                        }
                    };

                    if !buf.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut buf)));
                    }
                    segments.push(segment);
                }
                _ => {
                    return Err(TemplateError::Malformed {
                        position: pos,
                        reason: "dangling '%' (use '%%' for a literal percent sign)".into(),
                    });
                }
            }
        }

        if !buf.is_empty() {
            segments.push(Segment::Text(buf));
        }

        if !segments.contains(&Segment::Limit) {
            return Err(TemplateError::MissingPlaceholder(Self::LIMIT));
        }
        if !segments.contains(&Segment::Offset) {
            return Err(TemplateError::MissingPlaceholder(Self::OFFSET));
        }

        Ok(QueryTemplate { segments })
    }

    pub fn render(&self, page: &PageRequest) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Limit => out.push_str(&page.limit.to_string()),
                Segment::Offset => out.push_str(&page.offset.to_string()),
            }
        }
        out
    }
}

impl Display for QueryTemplate {
    /// Writes the template back in its `%`-format source form.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => write!(f, "{}", text.replace('%', "%%"))?,
                Segment::Limit => write!(f, "%({})s", Self::LIMIT)?,
                Segment::Offset => write!(f, "%({})s", Self::OFFSET)?,
            }
        }
        Ok(())
    }
}
