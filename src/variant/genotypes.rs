use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::{Genotype, VariantError};

/// Ordered collection of genotypes for one site, indexed by sample name.
///
/// The name index is built on the first name-based lookup and dropped on
/// every structural mutation. Freezing with [`GenotypesContext::immutable`]
/// turns every later mutation into [`VariantError::ImmutableGenotypes`].
#[derive(Debug, Clone, Default)]
pub struct GenotypesContext {
    genotypes: Vec<Genotype>,
    sample_index: OnceCell<HashMap<String, usize>>,
    immutable: bool,
}

impl GenotypesContext {
    /// Empty, mutable context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty context with room for `capacity` genotypes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            genotypes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Mutable context holding `genotypes` in order.
    pub fn from_genotypes(genotypes: impl IntoIterator<Item = Genotype>) -> Self {
        Self {
            genotypes: genotypes.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Freeze the context.
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Whether mutations are still allowed.
    pub fn is_mutable(&self) -> bool {
        !self.immutable
    }

    fn check_mutable(&mut self) -> Result<(), VariantError> {
        if self.immutable {
            return Err(VariantError::ImmutableGenotypes);
        }
        self.sample_index = OnceCell::new();
        Ok(())
    }

    fn index(&self) -> &HashMap<String, usize> {
        self.sample_index.get_or_init(|| {
            let mut index = HashMap::with_capacity(self.genotypes.len());
            for (idx, genotype) in self.genotypes.iter().enumerate() {
                index.entry(genotype.sample_name().to_string()).or_insert(idx);
            }
            index
        })
    }

    /// Append one genotype.
    pub fn add(&mut self, genotype: Genotype) -> Result<(), VariantError> {
        self.check_mutable()?;
        self.genotypes.push(genotype);
        Ok(())
    }

    /// Append several genotypes.
    pub fn add_all(&mut self, genotypes: impl IntoIterator<Item = Genotype>) -> Result<(), VariantError> {
        self.check_mutable()?;
        self.genotypes.extend(genotypes);
        Ok(())
    }

    /// Overwrite the genotype at `idx`.
    pub fn set(&mut self, idx: usize, genotype: Genotype) -> Result<Option<Genotype>, VariantError> {
        self.check_mutable()?;
        Ok(self
            .genotypes
            .get_mut(idx)
            .map(|slot| std::mem::replace(slot, genotype)))
    }

    /// Replace the genotype with the same sample name, or append it.
    pub fn replace(&mut self, genotype: Genotype) -> Result<Option<Genotype>, VariantError> {
        let existing = self.index().get(genotype.sample_name()).copied();
        match existing {
            Some(idx) => self.set(idx, genotype),
            None => self.add(genotype).map(|_| None),
        }
    }

    /// Remove the genotype for `sample_name`.
    pub fn remove(&mut self, sample_name: &str) -> Result<Option<Genotype>, VariantError> {
        let existing = self.index().get(sample_name).copied();
        self.check_mutable()?;
        Ok(existing.map(|idx| self.genotypes.remove(idx)))
    }

    /// Remove every genotype.
    pub fn clear(&mut self) -> Result<(), VariantError> {
        self.check_mutable()?;
        self.genotypes.clear();
        Ok(())
    }

    /// Number of genotypes.
    pub fn size(&self) -> usize {
        self.genotypes.len()
    }

    /// Whether there are no genotypes.
    pub fn is_empty(&self) -> bool {
        self.genotypes.is_empty()
    }

    /// Genotype at position `idx`.
    pub fn get_at(&self, idx: usize) -> Option<&Genotype> {
        self.genotypes.get(idx)
    }

    /// Genotype for `sample_name`.
    pub fn get(&self, sample_name: &str) -> Option<&Genotype> {
        self.index()
            .get(sample_name)
            .and_then(|&idx| self.genotypes.get(idx))
    }

    /// Whether a genotype exists for `sample_name`.
    pub fn contains_sample(&self, sample_name: &str) -> bool {
        self.index().contains_key(sample_name)
    }

    /// Genotypes in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Genotype> {
        self.genotypes.iter()
    }

    /// Sample names in insertion order.
    pub fn sample_names(&self) -> Vec<&str> {
        self.genotypes.iter().map(Genotype::sample_name).collect()
    }

    /// Sample names sorted lexicographically.
    pub fn sample_names_ordered(&self) -> Vec<&str> {
        let mut names = self.sample_names();
        names.sort_unstable();
        names
    }

    /// Largest ploidy among the genotypes.
    pub fn max_ploidy(&self) -> usize {
        self.genotypes.iter().map(Genotype::ploidy).max().unwrap_or(0)
    }

    /// Iterate genotypes ordered by sample name.
    ///
    /// The returned iterator is lazy and `Clone`, so a copy taken before
    /// consumption restarts the traversal.
    pub fn iterate_in_sample_name_order(&self) -> SampleOrderIter<'_> {
        let mut order: Vec<usize> = (0..self.genotypes.len()).collect();
        order.sort_by(|&a, &b| {
            self.genotypes[a]
                .sample_name()
                .cmp(self.genotypes[b].sample_name())
        });
        SampleOrderIter {
            genotypes: &self.genotypes,
            order: Arc::from(order),
            position: 0,
        }
    }

    /// Restrict to the samples in `sample_names`, preserving order.
    ///
    /// When every current sample is in the set the same shared context is
    /// returned; an empty set yields an empty frozen context.
    pub fn subset_to_samples(self: &Arc<Self>, sample_names: &HashSet<String>) -> Arc<Self> {
        if sample_names.is_empty() {
            return Arc::new(GenotypesContext::new().immutable());
        }
        if self
            .genotypes
            .iter()
            .all(|g| sample_names.contains(g.sample_name()))
        {
            return Arc::clone(self);
        }
        let subset = self
            .genotypes
            .iter()
            .filter(|g| sample_names.contains(g.sample_name()))
            .cloned();
        Arc::new(GenotypesContext::from_genotypes(subset).immutable())
    }

    /// First repeated sample name, if any.
    pub fn duplicate_sample(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.genotypes.len());
        self.genotypes
            .iter()
            .map(Genotype::sample_name)
            .find(|name| !seen.insert(*name))
    }
}

impl PartialEq for GenotypesContext {
    fn eq(&self, other: &Self) -> bool {
        self.genotypes == other.genotypes
    }
}

impl<'a> IntoIterator for &'a GenotypesContext {
    type Item = &'a Genotype;
    type IntoIter = std::slice::Iter<'a, Genotype>;

    fn into_iter(self) -> Self::IntoIter {
        self.genotypes.iter()
    }
}

impl FromIterator<Genotype> for GenotypesContext {
    fn from_iter<I: IntoIterator<Item = Genotype>>(iter: I) -> Self {
        GenotypesContext::from_genotypes(iter)
    }
}

/// Iterator over genotypes in sample-name order.
#[derive(Debug, Clone)]
pub struct SampleOrderIter<'a> {
    genotypes: &'a [Genotype],
    order: Arc<[usize]>,
    position: usize,
}

impl<'a> Iterator for SampleOrderIter<'a> {
    type Item = &'a Genotype;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = *self.order.get(self.position)?;
        self.position += 1;
        self.genotypes.get(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.order.len() - self.position;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{Allele, GenotypeBuilder};

    fn genotype(name: &str) -> Genotype {
        let reference = Allele::create("A", true).expect("ref");
        GenotypeBuilder::new(name, vec![reference.clone(), reference])
            .build()
            .expect("genotype")
    }

    #[test]
    fn lookup_rebuilds_after_mutation() {
        let mut context = GenotypesContext::from_genotypes(vec![genotype("b"), genotype("a")]);
        assert!(context.get("a").is_some());
        context.add(genotype("c")).expect("mutable");
        assert_eq!(context.get("c").map(Genotype::sample_name), Some("c"));
        assert!(context.get("zzz").is_none());

        context.remove("b").expect("mutable");
        assert_eq!(context.sample_names(), vec!["a", "c"]);
        assert!(!context.contains_sample("b"));
    }

    #[test]
    fn frozen_context_rejects_mutation() {
        let mut context = GenotypesContext::from_genotypes(vec![genotype("a")]).immutable();
        assert_eq!(context.add(genotype("b")), Err(VariantError::ImmutableGenotypes));
        assert_eq!(context.clear(), Err(VariantError::ImmutableGenotypes));
        assert_eq!(context.size(), 1);
    }

    #[test]
    fn replace_by_sample_name() {
        let mut context = GenotypesContext::from_genotypes(vec![genotype("a"), genotype("b")]);
        let updated = GenotypeBuilder::from(&genotype("a")).gq(42).build().expect("genotype");
        let previous = context.replace(updated).expect("mutable");
        assert!(previous.is_some());
        assert_eq!(context.get("a").map(Genotype::gq), Some(42));
        assert_eq!(context.size(), 2);
    }

    #[test]
    fn sample_order_iteration_is_restartable() {
        let context =
            GenotypesContext::from_genotypes(vec![genotype("c"), genotype("a"), genotype("b")]);
        let iter = context.iterate_in_sample_name_order();
        let first: Vec<&str> = iter.clone().map(Genotype::sample_name).collect();
        let second: Vec<&str> = iter.map(Genotype::sample_name).collect();
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn subset_semantics() {
        let context = Arc::new(
            GenotypesContext::from_genotypes(vec![genotype("a"), genotype("b"), genotype("c")])
                .immutable(),
        );

        let everyone: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert!(Arc::ptr_eq(&context, &context.subset_to_samples(&everyone)));

        let empty = context.subset_to_samples(&HashSet::new());
        assert!(empty.is_empty());

        let some: HashSet<String> = ["c", "a"].iter().map(|s| s.to_string()).collect();
        let subset = context.subset_to_samples(&some);
        assert_eq!(subset.sample_names(), vec!["a", "c"]);
    }

    #[test]
    fn detects_duplicate_samples() {
        let context = GenotypesContext::from_genotypes(vec![genotype("a"), genotype("a")]);
        assert_eq!(context.duplicate_sample(), Some("a"));
    }
}
