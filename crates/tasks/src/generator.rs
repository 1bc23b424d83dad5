//! Listing generator trait and the deterministic template implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Money;

use crate::error::TaskError;

/// A product listing produced by a generator for a search query that
/// matched nothing in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedListing {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    /// Label of the generator that produced this listing.
    pub source: String,
}

/// Trait for producing product listings from a search query.
#[async_trait]
pub trait ListingGenerator: Send + Sync {
    /// Generates a listing for the given query.
    async fn generate(&self, query: &str) -> Result<GeneratedListing, TaskError>;
}

#[derive(Debug, Default)]
struct TemplateState {
    fail: bool,
    generated: u32,
}

/// Deterministic template-based generator.
///
/// Produces the same listing for the same query, with a price derived
/// from the query text, so tests and demos behave reproducibly.
#[derive(Debug, Clone, Default)]
pub struct TemplateListingGenerator {
    state: Arc<RwLock<TemplateState>>,
}

impl TemplateListingGenerator {
    /// Creates a new template generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the generator to fail on subsequent calls.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    /// Returns the number of listings generated so far.
    pub fn generated_count(&self) -> u32 {
        self.state.read().unwrap().generated
    }
}

#[async_trait]
impl ListingGenerator for TemplateListingGenerator {
    async fn generate(&self, query: &str) -> Result<GeneratedListing, TaskError> {
        {
            let state = self.state.read().unwrap();
            if state.fail {
                return Err(TaskError::GenerationFailed(
                    "template generator configured to fail".to_string(),
                ));
            }
        }

        let query = query.trim();
        if query.is_empty() {
            return Err(TaskError::GenerationFailed("empty query".to_string()));
        }

        // Price in [$5.00, $54.99], a pure function of the query text.
        let seed: u32 = query.bytes().fold(0u32, |acc, b| {
            acc.wrapping_mul(31).wrapping_add(b as u32)
        });
        let price = Money::from_cents(500 + (seed % 5000) as i64);

        self.state.write().unwrap().generated += 1;

        Ok(GeneratedListing {
            name: title_case(query),
            description: format!(
                "Auto-generated listing for \"{query}\". Pending review before joining the regular catalog."
            ),
            price,
            stock: 10,
            source: "template".to_string(),
        })
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generation_is_deterministic() {
        let generator = TemplateListingGenerator::new();

        let first = generator.generate("garden gnome").await.unwrap();
        let second = generator.generate("garden gnome").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, "Garden Gnome");
        assert_eq!(first.source, "template");
        assert!(first.price.cents() >= 500);
        assert_eq!(generator.generated_count(), 2);
    }

    #[tokio::test]
    async fn different_queries_differ() {
        let generator = TemplateListingGenerator::new();

        let a = generator.generate("red mug").await.unwrap();
        let b = generator.generate("blue mug").await.unwrap();

        assert_ne!(a.name, b.name);
    }

    #[tokio::test]
    async fn configured_failure() {
        let generator = TemplateListingGenerator::new();
        generator.set_fail(true);

        let result = generator.generate("anything").await;
        assert!(matches!(result, Err(TaskError::GenerationFailed(_))));

        generator.set_fail(false);
        assert!(generator.generate("anything").await.is_ok());
    }

    #[tokio::test]
    async fn empty_query_rejected() {
        let generator = TemplateListingGenerator::new();
        let result = generator.generate("   ").await;
        assert!(matches!(result, Err(TaskError::GenerationFailed(_))));
    }
}
