//! Runtime configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::chat::{ChatProxy, DEFAULT_BASE_URL, DEFAULT_MAX_IMAGES, DEFAULT_MODEL};
use crate::error::Error;
use crate::fonts::FontConfig;
use crate::model::{Labels, PageGeometry};
use crate::pdf::RenderOptions;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub bind: SocketAddr,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub max_images: usize,
    /// Largest accepted request body in bytes.
    pub body_limit: usize,
    pub font_regular: Option<PathBuf>,
    pub font_bold: Option<PathBuf>,
    pub font_family: String,
    pub font_dirs: Vec<PathBuf>,
    pub brand: String,
    pub locale: String,
    pub system_prompt_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let fonts = FontConfig::default();
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            max_images: DEFAULT_MAX_IMAGES,
            body_limit: DEFAULT_BODY_LIMIT,
            font_regular: None,
            font_bold: None,
            font_family: fonts.family,
            font_dirs: Vec::new(),
            brand: RenderOptions::default().brand,
            locale: "en".to_string(),
            system_prompt_file: None,
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name}: '{value}' is not a valid number")))
}

fn split_paths(value: &str) -> Vec<PathBuf> {
    let sep = if cfg!(windows) { ';' } else { ':' };
    value
        .split(sep)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(bind) = get("REPORT_BIND") {
            config.bind = bind
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("REPORT_BIND: '{bind}' is not host:port")))?;
        }
        if let Some(port) = get("PORT") {
            config.bind.set_port(parse_number("PORT", &port)?);
        }

        config.openai_api_key = get("OPENAI_API_KEY");
        if let Some(model) = get("OPENAI_MODEL") {
            config.openai_model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            config.openai_base_url = url;
        }
        if let Some(n) = get("REPORT_MAX_IMAGES") {
            config.max_images = parse_number("REPORT_MAX_IMAGES", &n)?;
        }
        if let Some(n) = get("REPORT_BODY_LIMIT") {
            config.body_limit = parse_number("REPORT_BODY_LIMIT", &n)?;
        }

        config.font_regular = get("REPORT_FONT_REGULAR").map(PathBuf::from);
        config.font_bold = get("REPORT_FONT_BOLD").map(PathBuf::from);
        if let Some(family) = get("REPORT_FONT_FAMILY") {
            config.font_family = family;
        }
        if let Some(dirs) = get("REPORT_FONT_DIRS") {
            config.font_dirs = split_paths(&dirs);
        }

        if let Some(brand) = get("REPORT_BRAND") {
            config.brand = brand;
        }
        if let Some(locale) = get("REPORT_LOCALE") {
            config.locale = locale;
        }
        config.system_prompt_file = get("REPORT_SYSTEM_PROMPT_FILE").map(PathBuf::from);

        Ok(config)
    }

    pub fn fonts(&self) -> FontConfig {
        FontConfig {
            regular: self.font_regular.clone(),
            bold: self.font_bold.clone(),
            family: self.font_family.clone(),
            dirs: self.font_dirs.clone(),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            geometry: PageGeometry::A4,
            labels: Labels::for_locale(&self.locale),
            brand: self.brand.clone(),
            fonts: self.fonts(),
        }
    }

    /// The configured prompt file, or the built-in prompt.
    pub fn system_prompt(&self) -> Result<String, Error> {
        match &self.system_prompt_file {
            Some(path) => {
                let prompt = std::fs::read_to_string(path)?;
                log::debug!("system prompt from {} ({} bytes)", path.display(), prompt.len());
                Ok(prompt)
            }
            None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    pub fn chat_proxy(&self) -> Result<ChatProxy, Error> {
        Ok(ChatProxy::new(self.openai_api_key.clone())?
            .with_model(&self.openai_model)
            .with_base_url(&self.openai_base_url)
            .with_max_images(self.max_images)
            .with_system_prompt(self.system_prompt()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, Error> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let c = config(&[]).unwrap();
        assert_eq!(c, Config::default());
        assert_eq!(c.bind.to_string(), DEFAULT_BIND);
        assert_eq!(c.render_options().labels, Labels::english());
    }

    #[test]
    fn port_overrides_bind() {
        let c = config(&[("REPORT_BIND", "127.0.0.1:8080"), ("PORT", "9000")]).unwrap();
        assert_eq!(c.bind.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        assert!(matches!(config(&[("REPORT_MAX_IMAGES", "ten")]), Err(Error::Config(_))));
        assert!(matches!(config(&[("PORT", "-1")]), Err(Error::Config(_))));
    }

    #[test]
    fn locale_and_fonts_flow_into_render_options() {
        let c = config(&[
            ("REPORT_LOCALE", "sr"),
            ("REPORT_FONT_FAMILY", "Noto Sans"),
            ("REPORT_FONT_DIRS", "/a: /b"),
            ("REPORT_BRAND", "Acme"),
        ])
        .unwrap();
        let opts = c.render_options();
        assert_eq!(opts.labels.page, "Strana");
        assert_eq!(opts.fonts.family, "Noto Sans");
        assert_eq!(opts.brand, "Acme");
        if cfg!(not(windows)) {
            assert_eq!(opts.fonts.dirs, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        }
    }
}
