//! Identifier backfill for pages, sections and components

use uuid::Uuid;

use crate::state::FormDefinition;

/// Give `slot` a fresh identifier if it has none. Returns whether one was assigned.
pub fn ensure_id(slot: &mut Option<String>) -> bool {
    if slot.as_deref().is_some_and(|id| !id.is_empty()) {
        return false;
    }
    *slot = Some(Uuid::new_v4().to_string());
    true
}

/// Assign identifiers to every node of `form` lacking one.
///
/// Returns how many were assigned; a second call on the same form returns 0.
pub fn assign_ids(form: &mut FormDefinition) -> usize {
    let mut assigned = 0;
    for page in &mut form.pages {
        assigned += usize::from(ensure_id(&mut page.page_id));
        for section in &mut page.sections {
            assigned += usize::from(ensure_id(&mut section.section_id));
            for component in &mut section.components {
                assigned += usize::from(ensure_id(&mut component.component_id));
            }
        }
    }
    assigned
}
