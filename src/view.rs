use anyhow::bail;
use reqwest::Url;

use crate::links::FormTarget;

/// Which screen a render cycle draws. Carried through rendering explicitly
/// instead of living in a global.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Panel,
    FormView {
        entity_name: String,
        url: Url,
    },
}

impl View {
    /// `Panel -> FormView` for a rostered player.
    pub fn select(self, roster: &[String], form: &FormTarget, name: &str) -> anyhow::Result<Self> {
        if matches!(self, View::FormView { .. }) {
            bail!("a form is already open; go back to the panel first");
        }
        if !roster.iter().any(|member| member == name) {
            bail!("{name:?} is not on the roster");
        }
        Ok(View::FormView {
            entity_name: name.to_string(),
            url: form.deep_link(name),
        })
    }

    /// `FormView -> Panel`; going back from the panel stays put.
    pub fn back(self) -> Self {
        View::Panel
    }
}
