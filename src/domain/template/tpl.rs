//! Template module.
//!
//! This module contains the representation of the merge template: a
//! subject line and a body, both holding `{field}` placeholders
//! resolved against the columns of a recipient row.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::result;
use thiserror::Error;

use crate::{markup, Row};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot render template: missing field {0}")]
    RenderMissingFieldError(String),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the message template of one merge job.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MergeTpl {
    /// Represents the subject template.
    pub subject: String,
    /// Represents the body template.
    pub body: String,
}

/// Represents one rendered recipient message, typically shown to the
/// user before a run starts.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Preview {
    pub subject: String,
    pub body: String,
}

impl MergeTpl {
    pub fn new<S: ToString, B: ToString>(subject: S, body: B) -> Self {
        Self {
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    /// Renders the subject line for the given row.
    pub fn render_subject(&self, row: &Row) -> Result<String> {
        render(&self.subject, row)
    }

    /// Renders the body for the given row and converts its lightweight
    /// markup into HTML.
    pub fn render_body(&self, row: &Row) -> Result<String> {
        Ok(markup::to_html(&render(&self.body, row)?))
    }

    /// Renders both parts of the template for the given row, without
    /// any side effect.
    pub fn preview(&self, row: &Row) -> Result<Preview> {
        Ok(Preview {
            subject: self.render_subject(row)?,
            body: self.render_body(row)?,
        })
    }
}

/// Replaces every `{field}` placeholder of the template with the
/// matching row cell. Rendering is a pure function of its inputs.
pub fn render(tpl: &str, row: &Row) -> Result<String> {
    let placeholder = Regex::new(r"\{([^{}]+)\}").unwrap();

    let mut rendered = String::with_capacity(tpl.len());
    let mut last = 0;
    for caps in placeholder.captures_iter(tpl) {
        let field = caps.get(1).unwrap();
        let value = row
            .get(field.as_str())
            .ok_or_else(|| Error::RenderMissingFieldError(field.as_str().to_owned()))?;
        rendered.push_str(&tpl[last..caps.get(0).unwrap().start()]);
        rendered.push_str(value);
        last = caps.get(0).unwrap().end();
    }
    rendered.push_str(&tpl[last..]);

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        [("Name", "Alice"), ("Company", "Acme")].into_iter().collect()
    }

    #[test]
    fn test_render_replaces_fields() {
        assert_eq!(
            "Hello Alice from Acme",
            render("Hello {Name} from {Company}", &row()).unwrap()
        );
    }

    #[test]
    fn test_render_without_placeholder() {
        assert_eq!("Hello you", render("Hello you", &row()).unwrap());
    }

    #[test]
    fn test_render_is_pure() {
        let row = row();
        let first = render("Hi {Name}", &row).unwrap();
        let second = render("Hi {Name}", &row).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_missing_field() {
        assert!(matches!(
            render("Hello {Nickname}", &row()),
            Err(Error::RenderMissingFieldError(field)) if field == "Nickname"
        ));
    }

    #[test]
    fn test_render_subject_and_body() {
        let tpl = MergeTpl::new("Welcome {Name}", "Dear {Name},\n**{Company}** awaits.");
        let preview = tpl.preview(&row()).unwrap();

        assert_eq!("Welcome Alice", preview.subject);
        assert!(preview.body.contains("Dear Alice,<br><b>Acme</b> awaits."));
    }
}
