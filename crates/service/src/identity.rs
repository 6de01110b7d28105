use uuid::Uuid;

/// Source of identifiers for new records.
pub trait IdentityGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random 128-bit (v4) UUIDs in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdentityGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_generator_produces_distinct_hyphenated_ids() {
        let ids = UuidGenerator;
        let seen: HashSet<String> = (0..10_000).map(|_| ids.generate()).collect();
        assert_eq!(seen.len(), 10_000);
        assert!(seen.iter().all(|id| Uuid::parse_str(id).is_ok() && id.len() == 36));
    }
}
