//! Exact-match feedback: `guess & secret` and a popcount of the result.

use serde_json::Value;

use crate::{
    animation::base::{Animation, Theme},
    config::{Config, ConfigMap, config_map},
    foundation::{core::LOGICAL_WIDTH, core::Vec2, error::AsmvizResult},
    scene::step::Step,
};

pub(crate) fn defaults() -> ConfigMap {
    config_map([
        ("guess_value", Value::from("0x80A02040")),
        ("secret_value", Value::from("0x80102040")),
    ])
}

pub(crate) fn construct(cfg: &Config) -> AsmvizResult<Box<dyn Animation>> {
    Ok(Box::new(ExactMatch::from_config(cfg.clone())?))
}

pub struct ExactMatch {
    cfg: Config,
    theme: Theme,
    guess: u32,
    secret: u32,
}

impl ExactMatch {
    pub fn from_config(cfg: Config) -> AsmvizResult<Self> {
        Ok(Self {
            theme: Theme::from_config(&cfg)?,
            guess: cfg.get_u32_bits("guess_value")?,
            secret: cfg.get_u32_bits("secret_value")?,
            cfg,
        })
    }
}

impl Animation for ExactMatch {
    fn name(&self) -> &'static str {
        "exact_match"
    }

    fn config(&self) -> &Config {
        &self.cfg
    }

    fn setup(&self) -> Vec<Step> {
        let theme = &self.theme;
        let mut steps = theme.title_steps("title", "Exact Match Calculation");
        steps.push(theme.label(
            "intro",
            "AND operation: guess & secret",
            Vec2::new(LOGICAL_WIDTH / 2.0, 380.0),
            theme.font_size,
        ));
        steps
    }

    fn body(&self) -> Vec<Step> {
        let theme = &self.theme;
        let result = self.guess & self.secret;
        let matches = result.count_ones();

        let mut steps = vec![
            theme.label(
                "calc",
                &format!(
                    "0x{:08X} & 0x{:08X} = 0x{result:08X}",
                    self.guess, self.secret
                ),
                Vec2::new(LOGICAL_WIDTH / 2.0, 500.0),
                theme.font_size * 0.85,
            ),
            Step::wait(theme.wait_time),
        ];
        steps.push(theme.caption(
            "result",
            &format!("Number of exact matches: {matches}"),
            620.0,
        ));
        steps
    }

    fn teardown(&self) -> Vec<Step> {
        vec![Step::wait(3.0), self.theme.fade_out("title")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{global_defaults, resolve};

    #[test]
    fn default_values_yield_three_matches() {
        let cfg = resolve(&global_defaults(), &defaults(), &ConfigMap::new()).unwrap();
        let a = ExactMatch::from_config(cfg).unwrap();
        assert_eq!((a.guess & a.secret).count_ones(), 3);
    }

    #[test]
    fn lifecycle_is_scene_consistent() {
        let cfg = resolve(&global_defaults(), &defaults(), &ConfigMap::new()).unwrap();
        let a = ExactMatch::from_config(cfg).unwrap();
        crate::animation::base::Script::assemble(&a)
            .unwrap()
            .into_timeline()
            .unwrap();
    }
}
