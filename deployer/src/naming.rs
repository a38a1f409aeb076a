//! Collision-resistant resource naming
//!
//! Registry names are globally unique across all Azure tenants, and
//! instance names and DNS labels are unique per region. Appending a
//! random suffix to the operator's base names keeps repeated runs from
//! colliding in either scope, even when the base names are reused.

use uuid::Uuid;

/// Length of the random suffix in hex characters (48 bits of entropy)
const SUFFIX_LEN: usize = 12;

/// The derived names for one deployment run
#[derive(Debug, Clone)]
pub struct NameAllocation {
    /// Random suffix shared by all derived names
    pub suffix: String,

    /// Container instance name
    pub instance_name: String,

    /// Image repository name inside the registry
    pub image_repository: String,

    /// DNS label for the instance's public endpoint
    pub dns_label: String,
}

/// Derive the per-run resource names from the operator's base names.
///
/// Pure function of entropy; performs no remote calls and must run
/// before any remote mutation.
pub fn allocate(instance_base: &str, image_base: &str) -> NameAllocation {
    with_suffix(instance_base, image_base, &collision_suffix())
}

/// Derive names from a known suffix.
///
/// Re-runs of a saved configuration use this with the persisted suffix,
/// so they target the same instance name and converge on exactly one
/// instance instead of leaking one per run.
pub fn with_suffix(instance_base: &str, image_base: &str, suffix: &str) -> NameAllocation {
    let instance_name = format!("{}-{}", instance_base, suffix);

    NameAllocation {
        dns_label: instance_name.clone(),
        image_repository: format!("{}-{}", image_base, suffix),
        instance_name,
        suffix: suffix.to_string(),
    }
}

/// Random lowercase hex suffix drawn from OS entropy.
///
/// The first 12 hex characters of a v4 UUID precede the version nibble,
/// so all 48 bits are random.
fn collision_suffix() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..SUFFIX_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_suffix_format() {
        let suffix = collision_suffix();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(suffix, suffix.to_lowercase());
    }

    #[test]
    fn test_names_carry_suffix() {
        let names = allocate("app", "weather-mcp");
        assert!(names.instance_name.starts_with("app-"));
        assert!(names.instance_name.ends_with(&names.suffix));
        assert!(names.image_repository.starts_with("weather-mcp-"));
        assert!(names.image_repository.ends_with(&names.suffix));
        assert_eq!(names.dns_label, names.instance_name);
    }

    #[test]
    fn test_with_suffix_is_stable() {
        let first = with_suffix("app", "app", "ab12cd34ef56");
        let second = with_suffix("app", "app", "ab12cd34ef56");
        assert_eq!(first.instance_name, second.instance_name);
        assert_eq!(first.instance_name, "app-ab12cd34ef56");
    }

    #[test]
    fn test_no_collisions_across_many_runs() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let names = allocate("app", "app");
            assert!(seen.insert(names.suffix), "duplicate suffix allocated");
        }
    }
}
