//! Static registry of built-in annotation plugins.
//!
//! Every plugin is enumerated once here; configuration resolves names and
//! group names against this list at startup. There is no runtime discovery.

use crate::config::AnnotationConfig;

use super::{
    AnnotationError, Coverage, DepthPerAlleleBySample, GenotypeAnnotation, InfoFieldAnnotation,
    MappingQualityZero, RmsMappingQuality, VariantAnnotation,
};

fn all_info_annotations() -> Vec<Box<dyn InfoFieldAnnotation>> {
    vec![
        Box::new(Coverage),
        Box::new(MappingQualityZero),
        Box::new(RmsMappingQuality),
    ]
}

fn all_genotype_annotations() -> Vec<Box<dyn GenotypeAnnotation>> {
    vec![Box::new(DepthPerAlleleBySample)]
}

/// Names of every built-in annotation.
pub fn all_annotation_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = all_info_annotations()
        .iter()
        .map(|a| a.name())
        .chain(all_genotype_annotations().iter().map(|a| a.name()))
        .collect();
    names.sort_unstable();
    names
}

/// Names of every annotation group.
pub fn all_group_names() -> Vec<&'static str> {
    vec!["MappingQuality", "Standard"]
}

/// Resolve an [`AnnotationConfig`] against the registry.
///
/// An annotation is included when it belongs to a requested group or is
/// requested by name, and is not excluded. Unknown names or groups anywhere
/// in the configuration are fatal. The resolved lists are sorted by plugin
/// name.
pub fn resolve_annotations(
    config: &AnnotationConfig,
) -> Result<(Vec<Box<dyn InfoFieldAnnotation>>, Vec<Box<dyn GenotypeAnnotation>>), AnnotationError>
{
    let known_names = all_annotation_names();
    for requested in config
        .annotations_to_use
        .iter()
        .chain(config.annotations_to_exclude.iter())
    {
        if !known_names.contains(&requested.as_str()) {
            return Err(AnnotationError::UnknownAnnotation(requested.clone()));
        }
    }
    let known_groups = all_group_names();
    for group in &config.groups_to_use {
        if !known_groups.contains(&group.as_str()) {
            return Err(AnnotationError::UnknownGroup {
                requested: group.clone(),
                known: known_groups.clone(),
            });
        }
    }

    let selected = |annotation: &dyn VariantAnnotation| -> bool {
        if config
            .annotations_to_exclude
            .iter()
            .any(|n| n == annotation.name())
        {
            return false;
        }
        annotation
            .groups()
            .iter()
            .any(|g| config.groups_to_use.iter().any(|n| n == g.name()))
            || config
                .annotations_to_use
                .iter()
                .any(|n| n == annotation.name())
    };

    let mut info: Vec<Box<dyn InfoFieldAnnotation>> = all_info_annotations()
        .into_iter()
        .filter(|a| selected(a.as_ref()))
        .collect();
    info.sort_by_key(|a| a.name());
    let mut genotype: Vec<Box<dyn GenotypeAnnotation>> = all_genotype_annotations()
        .into_iter()
        .filter(|a| selected(a.as_ref()))
        .collect();
    genotype.sort_by_key(|a| a.name());
    Ok((info, genotype))
}

/// Configuration selecting every annotation minus the given exclusions.
pub fn all_minus_excluded(annotations_to_exclude: Vec<String>) -> AnnotationConfig {
    AnnotationConfig {
        groups_to_use: all_group_names().iter().map(|s| s.to_string()).collect(),
        annotations_to_use: all_annotation_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        annotations_to_exclude,
    }
}
