use crate::models::{CandidateFilter, Profile};

/// Check if a profile passes the discovery filter
///
/// `viewer_gender` is only consulted when the filter excludes profiles of the
/// viewer's own gender.
#[inline]
pub fn matches_filter(
    profile: &Profile,
    filter: &CandidateFilter,
    viewer_gender: Option<&str>,
) -> bool {
    // Check age range
    if let Some(from) = filter.age_from {
        if profile.age < from {
            return false;
        }
    }
    if let Some(to) = filter.age_to {
        if profile.age > to {
            return false;
        }
    }

    // Check city (case-insensitive)
    if let Some(city) = filter.city.as_deref().filter(|c| !c.trim().is_empty()) {
        match profile.city.as_deref() {
            Some(profile_city) if profile_city.eq_ignore_ascii_case(city.trim()) => {}
            _ => return false,
        }
    }

    // Check gender exclusion
    if filter.exclude_gender_matching {
        if let (Some(viewer), Some(gender)) = (viewer_gender, profile.gender.as_deref()) {
            if viewer.eq_ignore_ascii_case(gender) {
                return false;
            }
        }
    }

    // Check free-text search
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        if !matches_search(profile, search.trim()) {
            return false;
        }
    }

    true
}

/// Free-text match on name, bio and interests
fn matches_search(profile: &Profile, search: &str) -> bool {
    let needle = search.to_lowercase();

    profile.name.to_lowercase().contains(&needle)
        || profile
            .bio
            .as_deref()
            .is_some_and(|bio| bio.to_lowercase().contains(&needle))
        || profile
            .interests
            .iter()
            .any(|interest| interest.to_lowercase().contains(&needle))
}
