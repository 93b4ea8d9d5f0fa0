//! Built-in widget catalog.
//!
//! The concrete mockup widgets of the site. Each entry is static metadata
//! plus a constructor that builds (and validates) its definition on demand.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;
use crate::phase::{Choreography, CounterStyle, Effect, PhaseDef, StageObserver};

use super::panel::{Panel, PanelDef};
use super::shell::{Widget, WidgetConfig, WidgetDef};
use super::Mockup;

/// Whether an entry cycles through phases or shows one live panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Phase-cycling widget
    Cycling,
    /// Single live panel
    Panel,
}

/// A validated definition built from a catalog entry.
#[derive(Debug, Clone)]
pub enum Blueprint {
    /// Phase-cycling widget
    Cycling(Arc<WidgetDef>),
    /// Single live panel
    Panel(Arc<PanelDef>),
}

impl Blueprint {
    /// Phase names in display order.
    #[must_use]
    pub fn phase_names(&self) -> Vec<String> {
        match self {
            Self::Cycling(def) => def.phase_set().iter().map(ToString::to_string).collect(),
            Self::Panel(def) => vec![def.phase.id.to_string()],
        }
    }

    /// Default cycle interval, `None` for panels.
    #[must_use]
    pub fn default_interval(&self) -> Option<Duration> {
        match self {
            Self::Cycling(def) => Some(def.default_interval),
            Self::Panel(_) => None,
        }
    }
}

/// One built-in widget.
#[derive(Debug)]
pub struct CatalogEntry {
    /// Key used on the command line and in config files
    pub key: &'static str,
    /// Human-readable title
    pub title: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Cycling or panel
    pub kind: EntryKind,
    build: fn() -> Result<Blueprint, ConfigError>,
}

impl CatalogEntry {
    /// Builds and validates the definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the built-in definition is malformed.
    pub fn blueprint(&self) -> Result<Blueprint, ConfigError> {
        (self.build)()
    }

    /// Builds an inactive widget configured by `config`.
    ///
    /// Panels have no cycle, so `config.cycle_interval` is ignored for them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a malformed definition or a zero cycle
    /// interval.
    pub fn instantiate(
        &self,
        config: WidgetConfig,
        observer: Arc<dyn StageObserver>,
    ) -> Result<Box<dyn Mockup>, ConfigError> {
        Ok(match self.blueprint()? {
            Blueprint::Cycling(def) => Box::new(Widget::with_observer(def, config, observer)?),
            Blueprint::Panel(def) => {
                Box::new(Panel::with_observer(def, config.class_name, observer))
            }
        })
    }
}

static CATALOG: LazyLock<Vec<CatalogEntry>> = LazyLock::new(|| {
    vec![
        CatalogEntry {
            key: "mockup-rotator",
            title: "Landing page mockups",
            description: "Rotates through five landing-page layouts",
            kind: EntryKind::Cycling,
            build: mockup_rotator,
        },
        CatalogEntry {
            key: "gmn-search",
            title: "Google Business search",
            description: "Search, results, then a business profile filling its stars",
            kind: EntryKind::Cycling,
            build: gmn_search,
        },
        CatalogEntry {
            key: "rescue",
            title: "Site rescue",
            description: "A broken site being scanned and fixed",
            kind: EntryKind::Cycling,
            build: rescue,
        },
        CatalogEntry {
            key: "dashboard",
            title: "Client dashboard",
            description: "Live panel with a performance gauge and incoming leads",
            kind: EntryKind::Panel,
            build: dashboard,
        },
    ]
});

/// All built-in widgets.
#[must_use]
pub fn catalog() -> &'static [CatalogEntry] {
    &CATALOG
}

/// Finds a widget by key.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownWidget`] with the closest key as a
/// suggestion when nothing matches.
pub fn lookup(key: &str) -> Result<&'static CatalogEntry, ConfigError> {
    catalog()
        .iter()
        .find(|e| e.key == key)
        .ok_or_else(|| ConfigError::UnknownWidget {
            name: key.to_string(),
            suggestion: suggest(key),
        })
}

/// Closest catalog key to `key`, if any is reasonably close.
#[must_use]
pub fn suggest(key: &str) -> Option<String> {
    catalog()
        .iter()
        .map(|e| (e.key, strsim::jaro_winkler(key, e.key)))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k.to_string())
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn mockup_rotator() -> Result<Blueprint, ConfigError> {
    let phases = vec![
        PhaseDef::new("standard", ["Hero", "Features", "Call to action"]),
        PhaseDef::new("vsl", ["Video", "Headline", "Inscreva-se"]),
        PhaseDef::new("lead", ["Headline", "Form", "Submit"]),
        PhaseDef::new("portfolio", ["Gallery", "Project", "Project", "Project"]),
        PhaseDef::new("ecommerce", ["NOVIDADE", "Product", "Price", "Buy"]),
    ];
    let def = WidgetDef::new(
        "mockup-rotator",
        "Landing page mockups",
        phases,
        ms(4000),
        Choreography::rise(15.0, ms(100), ms(100)),
    )?;
    Ok(Blueprint::Cycling(Arc::new(def)))
}

fn gmn_search() -> Result<Blueprint, ConfigError> {
    let phases = vec![
        PhaseDef::new("search", ["Pesquisa Google", "Estou com sorte"]),
        PhaseDef::new("results", ["Seu Negócio", "São Paulo, SP · Aberto agora", "Map"]),
        PhaseDef::new("profile", ["Seu Negócio", "São Paulo, SP"])
            .with_effect(Effect::counter(
                "stars",
                Duration::ZERO,
                ms(300),
                1,
                5,
                CounterStyle::Stars,
            ))
            .with_effect(Effect::reveal("review", ms(2000), "Sua avaliação"))
            .with_effect(Effect::typewriter(
                "review-text",
                ms(2500),
                ms(80),
                "Excelente atendimento!",
            )),
    ];
    let def = WidgetDef::new(
        "gmn-search",
        "Google Business search",
        phases,
        ms(5000),
        Choreography::rise(20.0, ms(200), ms(150)),
    )?;
    Ok(Blueprint::Cycling(Arc::new(def)))
}

fn rescue() -> Result<Blueprint, ConfigError> {
    let phases = vec![
        PhaseDef::new("broken", ["Image Broken", "Layout shift"]),
        PhaseDef::new("scanning", ["Carregando...", "Scan"]),
        PhaseDef::new("fixed", ["Score 100", "Layout ok"]),
    ];
    let def = WidgetDef::new("rescue", "Site rescue", phases, ms(4000), Choreography::fade())?;
    Ok(Blueprint::Cycling(Arc::new(def)))
}

fn dashboard() -> Result<Blueprint, ConfigError> {
    let phase = PhaseDef::new(
        "live",
        ["Visitas Mensais 3.4k", "LCP: 0.8s · CLS: 0 · TBT: 40ms", "LIVE PREVIEW"],
    )
    .with_effect(Effect::counter(
        "performance",
        ms(1000),
        ms(30),
        2,
        98,
        CounterStyle::Score,
    ))
    .with_effect(Effect::feed(
        "leads",
        vec![1],
        ms(1000),
        ms(1200),
        5,
        6,
        "Lead Recente #{id}",
    ));
    let def = PanelDef::new("dashboard", "Client dashboard", phase, Choreography::fade())?;
    Ok(Blueprint::Panel(Arc::new(def)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entry_builds() {
        for entry in catalog() {
            let blueprint = entry
                .blueprint()
                .unwrap_or_else(|e| panic!("{} failed: {e}", entry.key));
            match (&blueprint, entry.kind) {
                (Blueprint::Cycling(def), EntryKind::Cycling) => assert_eq!(def.key, entry.key),
                (Blueprint::Panel(def), EntryKind::Panel) => assert_eq!(def.key, entry.key),
                _ => panic!("{} kind mismatch", entry.key),
            }
        }
    }

    #[test]
    fn test_keys_unique() {
        let mut keys: Vec<_> = catalog().iter().map(|e| e.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), catalog().len());
    }

    #[test]
    fn test_defaults_match_site() {
        let interval = |k| lookup(k).unwrap().blueprint().unwrap().default_interval();
        assert_eq!(interval("mockup-rotator"), Some(ms(4000)));
        assert_eq!(interval("gmn-search"), Some(ms(5000)));
        assert_eq!(interval("rescue"), Some(ms(4000)));
        assert_eq!(interval("dashboard"), None);
    }

    #[test]
    fn test_phase_order() {
        let names = lookup("gmn-search").unwrap().blueprint().unwrap().phase_names();
        assert_eq!(names, ["search", "results", "profile"]);
        let names = lookup("mockup-rotator").unwrap().blueprint().unwrap().phase_names();
        assert_eq!(names, ["standard", "vsl", "lead", "portfolio", "ecommerce"]);
    }

    #[test]
    fn test_unknown_key_suggests() {
        let err = lookup("gmn-serch").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown widget 'gmn-serch' (did you mean 'gmn-search'?)"
        );
        assert!(matches!(
            lookup("zzz"),
            Err(ConfigError::UnknownWidget { suggestion: None, .. })
        ));
    }
}
