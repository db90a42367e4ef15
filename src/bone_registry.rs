use glam::Mat4;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneInfo {
    /// Slot in the final bone palette.
    pub id: u32,
    /// Maps a vertex from model space into this bone's space.
    pub offset: Mat4,
}

/// Hands out stable bone ids shared by the mesh-skin loader and the animation loader, so vertex
/// bone indices and palette slots agree. Ids start at 0 and are never reused.
#[derive(Clone, Debug, Default)]
pub struct BoneIndexRegistry {
    infos: HashMap<Arc<str>, BoneInfo>,
    names: Vec<Arc<str>>,
}

impl BoneIndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, assigning the next free one (with an identity offset) on first use.
    pub fn id_for(&mut self, name: &str) -> u32 {
        self.register(name, Mat4::IDENTITY)
    }

    /// Registers `name` with a skin offset. A name that is already known keeps its original id and offset.
    pub fn register(&mut self, name: &str, offset: Mat4) -> u32 {
        if let Some(info) = self.infos.get(name) {
            return info.id;
        }
        let id = self.names.len() as u32;
        let key: Arc<str> = Arc::from(name);
        self.names.push(Arc::clone(&key));
        self.infos.insert(key, BoneInfo { id, offset });
        id
    }

    pub fn get(&self, name: &str) -> Option<&BoneInfo> {
        self.infos.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.infos.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(|name| name.as_ref())
    }

    pub fn names_by_id(&self) -> &[Arc<str>] {
        &self.names
    }

    pub fn bone_infos(&self) -> &HashMap<Arc<str>, BoneInfo> {
        &self.infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn repeated_names_keep_their_id() {
        let mut registry = BoneIndexRegistry::new();
        let hips = registry.id_for("hips");
        let spine = registry.id_for("spine");
        assert_eq!(registry.id_for("hips"), hips);
        assert_eq!(registry.id_for("spine"), spine);
        assert_ne!(hips, spine);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn distinct_names_span_zero_to_n() {
        let mut registry = BoneIndexRegistry::new();
        let names = ["root", "hips", "spine", "neck", "head", "arm_l", "arm_r"];
        let mut ids: Vec<u32> = names.iter().map(|name| registry.id_for(name)).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..names.len() as u32).collect::<Vec<_>>());
        assert_eq!(registry.name_of(3), Some("neck"));
    }

    #[test]
    fn first_registered_offset_wins() {
        let mut registry = BoneIndexRegistry::new();
        let offset = Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0));
        let id = registry.register("forearm", offset);
        assert_eq!(registry.register("forearm", Mat4::IDENTITY), id);
        assert_eq!(registry.id_for("forearm"), id);
        assert_eq!(registry.get("forearm").map(|info| info.offset), Some(offset));
    }

    #[test]
    fn animation_only_bones_get_identity_offsets() {
        let mut registry = BoneIndexRegistry::new();
        let id = registry.id_for("prop_socket");
        let info = registry.get("prop_socket").copied().expect("registered");
        assert_eq!(info.id, id);
        assert_eq!(info.offset, Mat4::IDENTITY);
        assert!(registry.get("missing").is_none());
    }
}
