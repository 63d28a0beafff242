//! HTML templates, compiled into the binary.

use anyhow::{Context as _, Result};
use tera::{Context, Tera};
use tracing::debug;

const TEMPLATES: [(&str, &str); 8] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("welcome.html", include_str!("../../templates/welcome.html")),
    ("home.html", include_str!("../../templates/home.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("register.html", include_str!("../../templates/register.html")),
    ("unverified.html", include_str!("../../templates/unverified.html")),
    ("activate.html", include_str!("../../templates/activate.html")),
    ("not_found.html", include_str!("../../templates/not_found.html")),
];

pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Parse every embedded template.
    ///
    /// # Errors
    /// Returns an error if a template fails to parse.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)
            .context("failed to load templates")?;

        debug!(count = TEMPLATES.len(), "templates loaded");

        Ok(Self { tera })
    }

    /// # Errors
    /// Returns an error if the template is unknown or rendering fails.
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(name, context)
            .with_context(|| format!("failed to render template {name}"))
    }
}
