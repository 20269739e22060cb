use anyhow::Context;
use reqwest::Url;

/// External form that collects one player's score, pre-filled by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTarget {
    base: Url,
    entry_key: String,
}

impl FormTarget {
    /// `base_url` is the form's `viewform` address; `question_id` is the
    /// numeric id of the name question (`entry.<id>`).
    pub fn new(base_url: &str, question_id: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid form url {base_url}"))?;
        let question_id = question_id.trim();
        anyhow::ensure!(
            !question_id.is_empty() && question_id.chars().all(|c| c.is_ascii_digit()),
            "form question id must be numeric, got {question_id:?}"
        );
        Ok(Self {
            base,
            entry_key: format!("entry.{question_id}"),
        })
    }

    /// Form URL with `name` pre-filled, form-urlencoded (space becomes `+`).
    pub fn deep_link(&self, name: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair(&self.entry_key, name);
        url
    }

    /// Reads the pre-filled name back out of a deep link.
    pub fn entry_name(&self, url: &Url) -> Option<String> {
        url.query_pairs()
            .find(|(key, _)| key == self.entry_key.as_str())
            .map(|(_, value)| value.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = "https://docs.example.com/forms/d/e/abc/viewform?usp=pp_url";

    fn target() -> FormTarget {
        FormTarget::new(FORM, "1935706063").unwrap()
    }

    #[test]
    fn spaces_encode_as_plus() {
        let link = target().deep_link("EDDIE ROBERTS");
        assert_eq!(
            link.as_str(),
            "https://docs.example.com/forms/d/e/abc/viewform?usp=pp_url&entry.1935706063=EDDIE+ROBERTS"
        );
    }

    #[test]
    fn name_round_trips() {
        let target = target();
        for name in ["EDDIE ROBERTS", "JOSÉ & MARÍA", "O'NEIL+1", "a=b?c#d"] {
            let link = target.deep_link(name);
            assert_eq!(target.entry_name(&link).as_deref(), Some(name));
        }
    }

    #[test]
    fn punctuation_is_escaped() {
        let link = target().deep_link("A&B=C#D");
        let query = link.query().unwrap_or_default();
        assert!(query.ends_with("entry.1935706063=A%26B%3DC%23D"));
        assert_eq!(link.fragment(), None);
    }

    #[test]
    fn rejects_bad_question_id() {
        assert!(FormTarget::new(FORM, "entry.12").is_err());
        assert!(FormTarget::new(FORM, "").is_err());
        assert!(FormTarget::new("no scheme", "12").is_err());
    }

    #[test]
    fn link_without_entry_has_no_name() {
        let url = Url::parse(FORM).unwrap();
        assert_eq!(target().entry_name(&url), None);
    }
}
