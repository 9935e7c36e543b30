//! Name-based dispatch for the built-in animation variants.
//!
//! The registry owns the global default option table plus, per variant, its
//! default table and constructor. `run <name>` looks the variant up here, so
//! an unknown name fails before any configuration or rendering work starts.

use std::collections::BTreeMap;

use crate::{
    animation::base::Animation,
    config::{Config, ConfigMap, global_defaults, resolve},
    foundation::error::{AsmvizError, AsmvizResult},
};

type DefaultsFn = fn() -> ConfigMap;
type ConstructFn = fn(&Config) -> AsmvizResult<Box<dyn Animation>>;

/// One registered variant: its identity plus the two hooks the registry
/// needs to resolve configuration and build an instance.
pub struct AnimationSpec {
    pub name: &'static str,
    pub description: &'static str,
    defaults: DefaultsFn,
    construct: ConstructFn,
}

impl AnimationSpec {
    pub fn defaults(&self) -> ConfigMap {
        (self.defaults)()
    }
}

pub struct Registry {
    globals: ConfigMap,
    specs: BTreeMap<&'static str, AnimationSpec>,
}

impl Registry {
    /// The registry with every shipped variant.
    pub fn builtin() -> Self {
        let mut specs = BTreeMap::new();
        for spec in [
            AnimationSpec {
                name: "register_packing",
                description: "Bit placement execution packing symbols into %ebx",
                defaults: crate::animations::register_packing::defaults,
                construct: crate::animations::register_packing::construct,
            },
            AnimationSpec {
                name: "register_packing_detailed",
                description: "Byte-by-byte register packing with rorb/rorl narration",
                defaults: crate::animations::register_packing_detailed::defaults,
                construct: crate::animations::register_packing_detailed::construct,
            },
            AnimationSpec {
                name: "exact_match",
                description: "Exact match calculation via AND and popcount",
                defaults: crate::animations::exact_match::defaults,
                construct: crate::animations::exact_match::construct,
            },
            AnimationSpec {
                name: "elimination_loop",
                description: "Candidate elimination loop over the combination table",
                defaults: crate::animations::elimination_loop::defaults,
                construct: crate::animations::elimination_loop::construct,
            },
            AnimationSpec {
                name: "entropy_reduction",
                description: "Possibility grid shrinking guess by guess",
                defaults: crate::animations::entropy_reduction::defaults,
                construct: crate::animations::entropy_reduction::construct,
            },
            AnimationSpec {
                name: "stack_overwrite",
                description: "Stack overwrite execution for the printf display",
                defaults: crate::animations::stack_overwrite::defaults,
                construct: crate::animations::stack_overwrite::construct,
            },
            AnimationSpec {
                name: "benchmark_chart",
                description: "Assembly vs C per-game benchmark bars",
                defaults: crate::animations::benchmark_chart::defaults,
                construct: crate::animations::benchmark_chart::construct,
            },
        ] {
            specs.insert(spec.name, spec);
        }
        Self {
            globals: global_defaults(),
            specs,
        }
    }

    /// Registered variant names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.keys().copied()
    }

    pub fn specs(&self) -> impl Iterator<Item = &AnimationSpec> + '_ {
        self.specs.values()
    }

    pub fn spec(&self, name: &str) -> AsmvizResult<&AnimationSpec> {
        self.specs.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.specs.keys().copied().collect();
            AsmvizError::unknown_animation(format!("'{}' (known: {})", name, known.join(", ")))
        })
    }

    /// Resolve the full configuration for `name` with `overrides` layered on
    /// top of the variant and global default tables.
    pub fn resolve(&self, name: &str, overrides: &ConfigMap) -> AsmvizResult<Config> {
        let spec = self.spec(name)?;
        resolve(&self.globals, &spec.defaults(), overrides)
    }

    /// Resolve configuration and construct the variant in one go.
    pub fn create(&self, name: &str, overrides: &ConfigMap) -> AsmvizResult<Box<dyn Animation>> {
        let spec = self.spec(name)?;
        let cfg = resolve(&self.globals, &spec.defaults(), overrides)?;
        (spec.construct)(&cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::AsmvizError;

    #[test]
    fn all_shipped_variants_are_registered() {
        let names: Vec<&str> = Registry::builtin().names().collect();
        assert_eq!(
            names,
            vec![
                "benchmark_chart",
                "elimination_loop",
                "entropy_reduction",
                "exact_match",
                "register_packing",
                "register_packing_detailed",
                "stack_overwrite",
            ]
        );
    }

    #[test]
    fn unknown_name_lists_known_variants() {
        let err = Registry::builtin()
            .create("register_packing_typo", &ConfigMap::new())
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, AsmvizError::UnknownAnimation(_)));
        assert!(err.to_string().contains("register_packing_typo"));
        assert!(err.to_string().contains("exact_match"));
    }

    #[test]
    fn every_variant_constructs_from_its_defaults() {
        let reg = Registry::builtin();
        for name in reg.names().collect::<Vec<_>>() {
            let anim = reg.create(name, &ConfigMap::new()).unwrap();
            assert_eq!(anim.name(), name);
        }
    }

    #[test]
    fn override_for_one_variant_is_rejected_by_another() {
        let reg = Registry::builtin();
        let mut overrides = ConfigMap::new();
        overrides.insert("guess_value".to_string(), serde_json::json!("0x80A02040"));
        assert!(reg.create("exact_match", &overrides).is_ok());
        assert!(reg.create("register_packing", &overrides).is_err());
    }
}
