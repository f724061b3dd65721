use std::collections::HashMap;

use tracing::warn;

use crate::annotation::{AnnotationError, FeatureTracker, HeaderCount, VcfHeaderLine};
use crate::variant::{AttributeMap, AttributeValue, VariantContext};

/// Field name copying the resource record's ID.
const ID_FIELD: &str = "ID";
/// Field name copying the resource record's first alternate allele.
const ALT_FIELD: &str = "ALT";

/// A `resource.field` pass-through request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaExpression {
    /// The full `resource.field` text, also the output key.
    pub full_name: String,
    /// Resource track name.
    pub resource: String,
    /// INFO field (or `ID`/`ALT`) to copy.
    pub field: String,
}

impl VaExpression {
    /// Parse `resource.field`, splitting at the last dot. The resource must
    /// be one of `resources`.
    pub fn parse(expression: &str, resources: &[String]) -> Result<Self, AnnotationError> {
        let (resource, field) = expression
            .rsplit_once('.')
            .filter(|(resource, field)| !resource.is_empty() && !field.is_empty())
            .ok_or_else(|| AnnotationError::MalformedExpression(expression.to_string()))?;
        if !resources.iter().any(|r| r == resource) {
            return Err(AnnotationError::UnknownResource {
                expression: expression.to_string(),
                resource: resource.to_string(),
            });
        }
        Ok(Self {
            full_name: expression.to_string(),
            resource: resource.to_string(),
            field: field.to_string(),
        })
    }

    /// Copy this expression's value from the first resource record at the
    /// site into `attributes`.
    pub fn apply(
        &self,
        tracker: &FeatureTracker,
        header_info: &HashMap<String, VcfHeaderLine>,
        vc: &VariantContext,
        attributes: &mut AttributeMap,
    ) -> Result<(), AnnotationError> {
        let Some(resource_vc) = tracker
            .values_at(&self.resource, vc.contig(), vc.start())
            .into_iter()
            .next()
        else {
            return Ok(());
        };

        match self.field.as_str() {
            ID_FIELD => {
                if let Some(id) = resource_vc.id() {
                    attributes.put(self.full_name.as_str(), id);
                }
            }
            ALT_FIELD => {
                if let Some(alt) = resource_vc.alternate_allele(0) {
                    attributes.put(self.full_name.as_str(), alt.display_string());
                }
            }
            field => {
                let Some(value) = resource_vc.attribute(field) else {
                    return Ok(());
                };
                let header = header_info
                    .get(&self.full_name)
                    .ok_or_else(|| AnnotationError::MissingExpressionHeader {
                        expression: self.full_name.clone(),
                        location: vc.location(),
                    })?;
                if resource_vc.n_alleles() < vc.n_alleles() {
                    warn!(
                        expression = %self.full_name,
                        location = %vc.location(),
                        "skipping expression, can not match {} alleles in the expression to {} in the variant",
                        resource_vc.n_alleles(),
                        vc.n_alleles()
                    );
                    return Ok(());
                }

                let per_allele = matches!(header.count, HeaderCount::A | HeaderCount::R);
                if resource_vc.n_alleles() > 2 && per_allele {
                    let with_ref = header.count == HeaderCount::R;
                    if let Some(values) = self.subset_to_shared_alleles(resource_vc, vc, value, with_ref) {
                        attributes.put(self.full_name.as_str(), values);
                    }
                } else {
                    attributes.put(self.full_name.as_str(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Values of a per-allele attribute restricted to the alleles the
    /// resource shares with `vc`, in resource order.
    fn subset_to_shared_alleles(
        &self,
        resource_vc: &VariantContext,
        vc: &VariantContext,
        value: &AttributeValue,
        with_ref: bool,
    ) -> Option<Vec<String>> {
        let cleaned: String = value
            .to_string()
            .chars()
            .filter(|c| !matches!(c, '[' | ']') && !c.is_whitespace())
            .collect();
        let mut values: Vec<String> = cleaned.split(',').map(str::to_string).collect();

        // (bases, is_reference) of the alleles the values describe
        let used: Vec<(String, bool)> = if vc.is_snp() && resource_vc.is_mixed() {
            let ref_len = resource_vc.reference().len();
            let mut kept_values = Vec::new();
            let mut same_length = vec![resource_vc.reference().bases().to_vec()];
            let mut remaining = values.iter();
            if with_ref {
                if let Some(ref_value) = remaining.next() {
                    kept_values.push(ref_value.clone());
                }
            }
            for allele in resource_vc.alternate_alleles() {
                let Some(allele_value) = remaining.next() else {
                    warn!(
                        expression = %self.full_name,
                        location = %vc.location(),
                        "cannot annotate expression for allele {}",
                        allele
                    );
                    break;
                };
                if allele.len() == ref_len {
                    same_length.push(allele.bases().to_vec());
                    kept_values.push(allele_value.clone());
                }
            }
            if same_length.len() < 2 {
                return None;
            }
            values = kept_values;
            let trimmed = trim_common_bases(&same_length);
            let skip = usize::from(!with_ref);
            trimmed
                .into_iter()
                .enumerate()
                .skip(skip)
                .map(|(idx, bases)| (bases, idx == 0))
                .collect()
        } else {
            let alleles = if with_ref {
                resource_vc.alleles()
            } else {
                resource_vc.alternate_alleles()
            };
            alleles
                .iter()
                .map(|allele| (allele.base_string(), allele.is_reference()))
                .collect()
        };

        if values.len() != used.len() {
            warn!(
                expression = %self.full_name,
                location = %vc.location(),
                "cannot annotate expression, {} values is not equal to {} expression alleles",
                values.len(),
                used.len()
            );
            return None;
        }

        let shared = used
            .iter()
            .zip(&values)
            .filter(|((bases, is_ref), _)| {
                vc.alleles()
                    .iter()
                    .any(|allele| allele.is_reference() == *is_ref && allele.base_string() == *bases)
            })
            .map(|(_, value)| value.clone())
            .collect();
        Some(shared)
    }
}

/// Strip the suffix, then the prefix, shared by every equal-length allele,
/// keeping at least one base.
fn trim_common_bases(alleles: &[Vec<u8>]) -> Vec<String> {
    let len = alleles.iter().map(Vec::len).min().unwrap_or(0);
    let all_equal_at = |idx: usize| alleles.iter().all(|a| a[idx] == alleles[0][idx]);
    let suffix = (0..len).rev().take_while(|&idx| all_equal_at(idx)).count().min(len.saturating_sub(1));
    let body = len - suffix;
    let prefix = (0..body).take_while(|&idx| all_equal_at(idx)).count().min(body.saturating_sub(1));
    alleles
        .iter()
        .map(|bases| String::from_utf8_lossy(&bases[prefix..body]).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::HeaderType;
    use crate::variant::{Allele, VariantContextBuilder};
    use pretty_assertions::assert_eq;

    fn allele(bases: &str, is_ref: bool) -> Allele {
        Allele::create(bases, is_ref).expect("allele")
    }

    fn record(alleles: &[(&str, bool)], attributes: &[(&str, &str)]) -> VariantContext {
        let alleles: Vec<Allele> = alleles.iter().map(|(b, r)| allele(b, *r)).collect();
        let stop = 100 + alleles[0].len() as u32 - 1;
        let mut builder = VariantContextBuilder::new("resource", "chr1", 100, stop, alleles).id("rs5");
        for (key, value) in attributes {
            builder = builder.attribute(*key, *value);
        }
        builder.make().expect("record")
    }

    fn header(id: &str, count: HeaderCount) -> HashMap<String, VcfHeaderLine> {
        HashMap::from([(id.to_string(), VcfHeaderLine::info(id, count, HeaderType::String, "copied"))])
    }

    #[test]
    fn parse_splits_at_last_dot() {
        let resources = vec!["foo.bar".to_string()];
        let expr = VaExpression::parse("foo.bar.AF", &resources).expect("parse");
        assert_eq!(expr.resource, "foo.bar");
        assert_eq!(expr.field, "AF");
        assert_eq!(
            VaExpression::parse("AF", &resources),
            Err(AnnotationError::MalformedExpression("AF".to_string()))
        );
        assert!(matches!(
            VaExpression::parse("other.AF", &resources),
            Err(AnnotationError::UnknownResource { .. })
        ));
    }

    #[test]
    fn copies_id_alt_and_scalar_fields() {
        let mut tracker = FeatureTracker::new();
        tracker.add("res", record(&[("A", true), ("G", false)], &[("AF", "0.5")]));
        let resources = vec!["res".to_string()];
        let vc = record(&[("A", true), ("G", false)], &[]);
        let headers = header("res.AF", HeaderCount::A);

        let mut attributes = AttributeMap::new();
        for text in ["res.ID", "res.ALT", "res.AF", "res.MISSING"] {
            let expr = VaExpression::parse(text, &resources).expect("parse");
            expr.apply(&tracker, &headers, &vc, &mut attributes).expect("apply");
        }
        assert_eq!(attributes.get("res.ID").map(AttributeValue::as_string), Some("rs5".to_string()));
        assert_eq!(attributes.get("res.ALT").map(AttributeValue::as_string), Some("G".to_string()));
        assert_eq!(attributes.get("res.AF").map(AttributeValue::as_string), Some("0.5".to_string()));
        assert!(!attributes.contains_key("res.MISSING"));
    }

    #[test]
    fn missing_header_is_an_error() {
        let mut tracker = FeatureTracker::new();
        tracker.add("res", record(&[("A", true), ("G", false)], &[("AF", "0.5")]));
        let resources = vec!["res".to_string()];
        let expr = VaExpression::parse("res.AF", &resources).expect("parse");
        let vc = record(&[("A", true), ("G", false)], &[]);
        let err = expr
            .apply(&tracker, &HashMap::new(), &vc, &mut AttributeMap::new())
            .expect_err("no header");
        assert!(matches!(err, AnnotationError::MissingExpressionHeader { .. }));
    }

    #[test]
    fn multi_allelic_values_are_subset_to_shared_alleles() {
        let mut tracker = FeatureTracker::new();
        tracker.add(
            "res",
            record(&[("A", true), ("C", false), ("G", false)], &[("AF", "0.1,0.2"), ("AD", "5,3,2")]),
        );
        let resources = vec!["res".to_string()];
        let vc = record(&[("A", true), ("G", false)], &[]);
        let mut headers = header("res.AF", HeaderCount::A);
        headers.extend(header("res.AD", HeaderCount::R));

        let mut attributes = AttributeMap::new();
        for text in ["res.AF", "res.AD"] {
            let expr = VaExpression::parse(text, &resources).expect("parse");
            expr.apply(&tracker, &headers, &vc, &mut attributes).expect("apply");
        }
        assert_eq!(attributes.get("res.AF").map(AttributeValue::as_string), Some("0.2".to_string()));
        assert_eq!(attributes.get("res.AD").map(AttributeValue::as_string), Some("5,2".to_string()));
    }

    #[test]
    fn snp_against_mixed_resource_uses_trimmed_same_length_alleles() {
        let mut tracker = FeatureTracker::new();
        tracker.add(
            "res",
            record(&[("AC", true), ("GC", false), ("A", false), ("TC", false)], &[("AF", "0.1,0.2,0.3")]),
        );
        let resources = vec!["res".to_string()];
        let vc = record(&[("A", true), ("T", false)], &[]);
        let headers = header("res.AF", HeaderCount::A);

        let mut attributes = AttributeMap::new();
        VaExpression::parse("res.AF", &resources)
            .expect("parse")
            .apply(&tracker, &headers, &vc, &mut attributes)
            .expect("apply");
        assert_eq!(attributes.get("res.AF").map(AttributeValue::as_string), Some("0.3".to_string()));
    }

    #[test]
    fn fewer_resource_alleles_skips() {
        let mut tracker = FeatureTracker::new();
        tracker.add("res", record(&[("A", true), ("G", false)], &[("AF", "0.5")]));
        let resources = vec!["res".to_string()];
        let vc = record(&[("A", true), ("G", false), ("T", false)], &[]);
        let headers = header("res.AF", HeaderCount::A);
        let mut attributes = AttributeMap::new();
        VaExpression::parse("res.AF", &resources)
            .expect("parse")
            .apply(&tracker, &headers, &vc, &mut attributes)
            .expect("apply");
        assert!(attributes.is_empty());
    }
}
