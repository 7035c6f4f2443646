//! Stack manipulation: dup, drop, swap, rot.
use testmachine_core::{Operation, Transform, TypeTag};

use crate::qualified;

/// `dup`, `drop`, `swap` and `rot` over a single tag.
///
/// These only rearrange bindings, so trace variables are preserved and the
/// steps do not appear in rendered traces.
pub fn basic_operations(tag: TypeTag) -> Vec<Operation> {
    let one = vec![tag.clone()];
    let two = vec![tag.clone(), tag.clone()];
    let three = vec![tag.clone(), tag.clone(), tag.clone()];

    vec![
        Transform::rearrange(qualified("dup", &tag), one.clone(), vec![0, 0]).into(),
        Transform::rearrange(qualified("drop", &tag), one, vec![]).into(),
        Transform::rearrange(qualified("swap", &tag), two, vec![1, 0]).into(),
        Transform::rearrange(qualified("rot", &tag), three, vec![2, 0, 1]).into(),
    ]
}
