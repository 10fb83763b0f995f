use std::collections::BTreeMap;

/// Per-session form entries keyed scene-id → field-id → value. Owned by the
/// orchestrator; mutated only through its input callbacks and read by the
/// submission collaborator.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SessionFormState {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl SessionFormState {
    pub fn set_field(
        &mut self,
        scene_id: impl Into<String>,
        field_id: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.entries
            .entry(scene_id.into())
            .or_default()
            .insert(field_id.into(), value.into());
    }

    pub fn field(&self, scene_id: &str, field_id: &str) -> Option<&str> {
        self.entries
            .get(scene_id)
            .and_then(|fields| fields.get(field_id))
            .map(String::as_str)
    }

    /// All entered fields for one scene. Empty map if nothing was entered.
    pub fn scene_data(&self, scene_id: &str) -> BTreeMap<String, String> {
        self.entries.get(scene_id).cloned().unwrap_or_default()
    }

    /// Drop a scene's entries after a successful hand-off.
    pub fn clear_scene(&mut self, scene_id: &str) {
        self.entries.remove(scene_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|fields| fields.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_read_back() {
        let mut form = SessionFormState::default();
        form.set_field("s1", "email", "a@b.c");
        form.set_field("s1", "name", "Ada");
        assert_eq!(form.field("s1", "email"), Some("a@b.c"));
        assert_eq!(form.scene_data("s1").len(), 2);
        assert!(!form.is_empty());
    }

    #[test]
    fn overwrite_keeps_latest_value() {
        let mut form = SessionFormState::default();
        form.set_field("s1", "email", "old");
        form.set_field("s1", "email", "new");
        assert_eq!(form.field("s1", "email"), Some("new"));
    }

    #[test]
    fn clear_scene_is_scoped() {
        let mut form = SessionFormState::default();
        form.set_field("s1", "a", "1");
        form.set_field("s2", "b", "2");
        form.clear_scene("s1");
        assert_eq!(form.field("s1", "a"), None);
        assert_eq!(form.field("s2", "b"), Some("2"));
    }

    #[test]
    fn missing_scene_reads_as_empty() {
        let form = SessionFormState::default();
        assert!(form.scene_data("nope").is_empty());
        assert!(form.is_empty());
    }
}
