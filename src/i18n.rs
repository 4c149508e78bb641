// i18n.rs — navigator labels and viewer text
//
// Strings live in either:
//   A) assets/i18n/<lang>.json
//   B) assets/i18n.json (single file, format: { "<lang>": { "key": "value" } })
// Load order: selected lang -> English. English is also compiled in, so the
// direction labels resolve even when no assets ship with the binary.
//
// Language selection: --lang <code>, then VR_ORBIT_LANG, then "en".

use once_cell::sync::{Lazy, OnceCell};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

const FALLBACK_LANG: &str = "en";
const EMBEDDED_EN: &str = include_str!("../assets/i18n/en.json");

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
}

impl I18n {
    /// Builds a table from already-parsed maps. `init` is the usual entry
    /// point; this exists for callers that embed their own strings.
    pub fn from_maps(
        lang: impl Into<String>,
        map: HashMap<String, String>,
        fallback_map: HashMap<String, String>,
    ) -> Self {
        Self {
            lang: lang.into(),
            map,
            fallback_map,
        }
    }

    pub fn get(&self, key: &str) -> String {
        self.map
            .get(key)
            .or_else(|| self.fallback_map.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();
static EMBEDDED: Lazy<HashMap<String, String>> =
    Lazy::new(|| parse_map(EMBEDDED_EN).unwrap_or_default());

fn parse_map(text: &str) -> Option<HashMap<String, String>> {
    match serde_json::from_str(text) {
        Ok(m) => Some(m),
        Err(e) => {
            log::warn!("ignoring malformed i18n table: {e}");
            None
        }
    }
}

fn load_json_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    parse_map(&text)
}

fn load_multi_lang_json(path: &Path, lang: &str) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    let all: HashMap<String, HashMap<String, String>> = serde_json::from_str(&text).ok()?;
    all.get(lang).cloned()
}

/// Looks for `relative` next to the executable, then under the working dir.
fn find_asset(relative: &Path) -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join(relative);
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join(relative);
    p.exists().then_some(p)
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    let per_lang = PathBuf::from("i18n").join(format!("{lang}.json"));
    if let Some(m) = find_asset(&per_lang).and_then(|p| load_json_map(&p)) {
        return m;
    }

    if let Some(m) = find_asset(Path::new("i18n.json")).and_then(|p| load_multi_lang_json(&p, lang)) {
        return m;
    }

    if lang == FALLBACK_LANG {
        return (*EMBEDDED).clone();
    }

    log::info!("no strings found for language {lang}");
    HashMap::new()
}

/// Initializes the global table. Later calls replace the current language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let map = load_lang(&lang);
    let fallback_map = if lang == FALLBACK_LANG {
        map.clone()
    } else {
        load_lang(FALLBACK_LANG)
    };
    install(I18n::from_maps(lang, map, fallback_map));
}

fn install(i: I18n) {
    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else if let Err(rejected) = I18N.set(RwLock::new(i)) {
        // lost an init race; overwrite the winner
        if let (Some(lock), Ok(i)) = (I18N.get(), rejected.into_inner()) {
            if let Ok(mut w) = lock.write() {
                *w = i;
            }
        }
    }
}

/// Localized text for `key`. Falls back to English, then to the key itself.
pub fn tr(key: &str) -> String {
    match I18N.get().and_then(|l| l.read().ok()) {
        Some(i) => i.get(key),
        None => EMBEDDED
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string()),
    }
}

/// Localized text with `{name}` placeholders substituted. Placeholders without
/// a value are kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}

/// Chooses the language from CLI/env.
pub fn resolve_lang_from_args() -> String {
    let mut it = std::env::args();
    while let Some(a) = it.next() {
        if a == "--lang" {
            if let Some(v) = it.next() {
                return v;
            }
        }
    }

    if let Ok(v) = std::env::var("VR_ORBIT_LANG") {
        if !v.trim().is_empty() {
            return v;
        }
    }

    FALLBACK_LANG.to_string()
}
