//! Configuration resolution.
//!
//! Every animation variant owns a default option table; the caller may layer
//! overrides (from a JSON file or inline) on top. [`resolve`] merges the
//! global defaults, the variant defaults and the overrides into one
//! [`Config`] with the precedence overrides > variant > global, and rejects
//! override keys that neither default table knows about so typos fail loudly
//! instead of being silently ignored.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::foundation::{
    core::Rgba8,
    error::{AsmvizError, AsmvizResult},
};

/// Ordered option-name to value mapping.
pub type ConfigMap = BTreeMap<String, Value>;

/// Build a `ConfigMap` from `(key, value)` pairs.
pub fn config_map<I, K>(pairs: I) -> ConfigMap
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Options shared by every animation, mirroring the defaults the blog's
/// original render script applied to all scenes.
pub fn global_defaults() -> ConfigMap {
    config_map([
        ("background_color", Value::from("#1a1a1a")),
        ("text_color", Value::from("#ffffff")),
        ("highlight_color", Value::from("#ffd34d")),
        ("success_color", Value::from("#4caf50")),
        ("error_color", Value::from("#ef5350")),
        ("font_size", Value::from(36.0)),
        ("animation_speed", Value::from(1.0)),
        ("wait_time", Value::from(1.0)),
        ("font_source", Value::from("assets/JetBrainsMono-Regular.ttf")),
    ])
}

/// A fully resolved configuration: every key a variant consumes is present.
#[derive(Clone, Debug, PartialEq)]
pub struct Config(ConfigMap);

/// Merge defaults and overrides into a resolved [`Config`].
///
/// Pure and idempotent: the same three inputs always produce a
/// value-identical result. Fails with [`AsmvizError::Config`] when an
/// override names an option unknown to both default tables.
pub fn resolve(
    global: &ConfigMap,
    variant: &ConfigMap,
    overrides: &ConfigMap,
) -> AsmvizResult<Config> {
    for key in overrides.keys() {
        if !global.contains_key(key) && !variant.contains_key(key) {
            return Err(AsmvizError::config(format!(
                "unknown option '{key}' (not declared by the animation or the global defaults)"
            )));
        }
    }

    let mut merged = global.clone();
    merged.extend(variant.clone());
    merged.extend(overrides.clone());
    Ok(Config(merged))
}

impl Config {
    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> AsmvizResult<&Value> {
        self.0
            .get(key)
            .ok_or_else(|| AsmvizError::config(format!("missing option '{key}'")))
    }

    /// Borrow the underlying map (key enumeration, tests).
    pub fn as_map(&self) -> &ConfigMap {
        &self.0
    }

    pub fn get_f64(&self, key: &str) -> AsmvizResult<f64> {
        self.get(key)?
            .as_f64()
            .ok_or_else(|| type_err(key, "a number"))
    }

    pub fn get_usize(&self, key: &str) -> AsmvizResult<usize> {
        self.get(key)?
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| type_err(key, "a non-negative integer"))
    }

    /// A `u32` bit pattern, given either as a JSON number or a `"0x…"` hex
    /// string (register values read better in hex).
    pub fn get_u32_bits(&self, key: &str) -> AsmvizResult<u32> {
        let value = self.get(key)?;
        if let Some(n) = value.as_u64() {
            return u32::try_from(n).map_err(|_| type_err(key, "a value fitting in 32 bits"));
        }
        if let Some(s) = value.as_str() {
            let digits = s
                .strip_prefix("0x")
                .or_else(|| s.strip_prefix("0X"))
                .unwrap_or(s);
            return u32::from_str_radix(digits, 16)
                .map_err(|_| type_err(key, "a hex string like \"0x80808080\""));
        }
        Err(type_err(key, "a number or hex string"))
    }

    pub fn get_str(&self, key: &str) -> AsmvizResult<&str> {
        self.get(key)?
            .as_str()
            .ok_or_else(|| type_err(key, "a string"))
    }

    pub fn get_color(&self, key: &str) -> AsmvizResult<Rgba8> {
        Rgba8::from_hex(self.get_str(key)?)
            .map_err(|_| type_err(key, "a color like \"#rrggbb\""))
    }

    pub fn get_u64_list(&self, key: &str) -> AsmvizResult<Vec<u64>> {
        let items = self
            .get(key)?
            .as_array()
            .ok_or_else(|| type_err(key, "a list of integers"))?;
        items
            .iter()
            .map(|v| v.as_u64().ok_or_else(|| type_err(key, "a list of integers")))
            .collect()
    }

    pub fn get_usize_list(&self, key: &str) -> AsmvizResult<Vec<usize>> {
        Ok(self
            .get_u64_list(key)?
            .into_iter()
            .map(|v| v as usize)
            .collect())
    }

    pub fn get_str_list(&self, key: &str) -> AsmvizResult<Vec<String>> {
        let items = self
            .get(key)?
            .as_array()
            .ok_or_else(|| type_err(key, "a list of strings"))?;
        items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| type_err(key, "a list of strings"))
            })
            .collect()
    }
}

fn type_err(key: &str, expected: &str) -> AsmvizError {
    AsmvizError::config(format!("option '{key}' must be {expected}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant_defaults() -> ConfigMap {
        config_map([
            ("symbols", serde_json::json!(["A", "B"])),
            ("initial_mask", Value::from("0x80808080")),
            ("delay", Value::from(0.5)),
        ])
    }

    #[test]
    fn precedence_is_override_variant_global() {
        let global = global_defaults();
        let variant = config_map([("wait_time", Value::from(2.0)), ("delay", Value::from(0.5))]);
        let overrides = config_map([("delay", Value::from(0.1))]);

        let cfg = resolve(&global, &variant, &overrides).unwrap();
        assert_eq!(cfg.get_f64("wait_time").unwrap(), 2.0);
        assert_eq!(cfg.get_f64("delay").unwrap(), 0.1);
        assert_eq!(cfg.get_f64("animation_speed").unwrap(), 1.0);
    }

    #[test]
    fn unknown_override_key_is_rejected_with_key_name() {
        let err = resolve(
            &global_defaults(),
            &variant_defaults(),
            &config_map([("dealy", Value::from(0.1))]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("'dealy'"));
    }

    #[test]
    fn resolve_is_idempotent() {
        let global = global_defaults();
        let variant = variant_defaults();
        let overrides = config_map([("delay", Value::from(0.25))]);

        let a = resolve(&global, &variant, &overrides).unwrap();
        let b = resolve(&global, &variant, &overrides).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn resolved_config_contains_all_default_keys() {
        let global = global_defaults();
        let variant = variant_defaults();
        let cfg = resolve(&global, &variant, &ConfigMap::new()).unwrap();
        for key in global.keys().chain(variant.keys()) {
            assert!(cfg.as_map().contains_key(key), "missing '{key}'");
        }
    }

    #[test]
    fn u32_bits_accepts_hex_strings_and_numbers() {
        let cfg = resolve(
            &ConfigMap::new(),
            &config_map([("a", Value::from("0x80A02040")), ("b", Value::from(16u64))]),
            &ConfigMap::new(),
        )
        .unwrap();
        assert_eq!(cfg.get_u32_bits("a").unwrap(), 0x80A0_2040);
        assert_eq!(cfg.get_u32_bits("b").unwrap(), 16);
    }

    #[test]
    fn typed_accessors_name_the_offending_key() {
        let cfg = resolve(
            &ConfigMap::new(),
            &config_map([("count", Value::from("ten"))]),
            &ConfigMap::new(),
        )
        .unwrap();
        let err = cfg.get_usize("count").unwrap_err();
        assert!(err.to_string().contains("'count'"));
        assert!(cfg.get_f64("absent").is_err());
    }
}
