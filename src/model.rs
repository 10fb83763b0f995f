use std::collections::BTreeSet;

use crate::error::{CinescrollError, CinescrollResult};

/// Externally-authored scene descriptor. The engine never creates, mutates,
/// or deletes scenes; it only reads them by index.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub id: String,
    pub order: u32,
    #[serde(default)]
    pub content_blocks: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<FormDescriptor>,
}

impl Scene {
    /// Text fed to the choreographer: the first text-bearing block, if any.
    pub fn headline(&self) -> Option<&str> {
        self.content_blocks
            .iter()
            .find(|b| !b.text.is_empty())
            .map(|b| b.text.as_str())
    }
}

/// Opaque content payload; the engine only cares about the text.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ContentBlock {
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FormDescriptor {
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

/// Validated, order-sorted scene sequence. Sorted once at construction;
/// re-sorting mid-session is undefined behavior, so no mutation is exposed.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneList {
    scenes: Vec<Scene>,
}

impl SceneList {
    pub fn new(mut scenes: Vec<Scene>) -> CinescrollResult<Self> {
        if scenes.is_empty() {
            return Err(CinescrollError::validation(
                "scene list must contain at least one scene",
            ));
        }

        let mut ids = BTreeSet::new();
        let mut orders = BTreeSet::new();
        for scene in &scenes {
            if scene.id.trim().is_empty() {
                return Err(CinescrollError::validation("scene id must be non-empty"));
            }
            if !ids.insert(scene.id.clone()) {
                return Err(CinescrollError::validation(format!(
                    "duplicate scene id '{}'",
                    scene.id
                )));
            }
            if !orders.insert(scene.order) {
                return Err(CinescrollError::validation(format!(
                    "duplicate scene order {} (id '{}')",
                    scene.order, scene.id
                )));
            }
        }

        scenes.sort_by_key(|s| s.order);
        Ok(Self { scenes })
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.scenes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, order: u32) -> Scene {
        Scene {
            id: id.to_string(),
            order,
            content_blocks: vec![ContentBlock {
                kind: "headline".to_string(),
                text: format!("scene {id}"),
            }],
            form: None,
        }
    }

    #[test]
    fn scenes_are_sorted_by_order() {
        let list = SceneList::new(vec![scene("b", 2), scene("a", 1), scene("c", 3)]).unwrap();
        let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(list.last_index(), 2);
    }

    #[test]
    fn gaps_in_order_are_allowed() {
        let list = SceneList::new(vec![scene("a", 0), scene("b", 10), scene("c", 40)]).unwrap();
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(SceneList::new(vec![]).is_err());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        assert!(SceneList::new(vec![scene("a", 1), scene("a", 2)]).is_err());
    }

    #[test]
    fn duplicate_order_is_rejected() {
        assert!(SceneList::new(vec![scene("a", 1), scene("b", 1)]).is_err());
    }

    #[test]
    fn headline_skips_empty_blocks() {
        let mut s = scene("a", 1);
        s.content_blocks.insert(
            0,
            ContentBlock {
                kind: "spacer".to_string(),
                text: String::new(),
            },
        );
        assert_eq!(s.headline(), Some("scene a"));
    }

    #[test]
    fn json_roundtrip() {
        let list = SceneList::new(vec![scene("a", 1), scene("b", 2)]).unwrap();
        let s = serde_json::to_string_pretty(&list).unwrap();
        let de: SceneList = serde_json::from_str(&s).unwrap();
        assert_eq!(de.len(), 2);
    }
}
