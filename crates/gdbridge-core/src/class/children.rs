//! Child node assertion.
//!
//! A `#[bridge(child)]` field of a node-based class declares a child node
//! that must exist under the instance. After construction the field is
//! populated with the existing child of that name, or a new node of the
//! field's class is created, named and added.

use crate::builtin::{NodePath, StringName};
use crate::classes::{Inherits, Node};
use crate::error::{BridgeError, BridgeResult, ConversionError};
use crate::obj::Obj;

/// Finds the child `name` of `parent`, or creates it, and stores it in `slot`.
///
/// A slot that already holds a live node is left alone.
pub fn assert_child<P, T>(parent: &Obj<P>, name: &str, slot: &mut Option<Obj<T>>) -> BridgeResult<()>
where
    P: Inherits<Node>,
    T: Inherits<Node>,
{
    if slot.as_ref().is_some_and(Obj::is_valid) {
        return Ok(());
    }

    if let Some(existing) = parent.get_node_or_null(&NodePath::from(name))? {
        let child = existing.cast::<T>().map_err(|_| {
            BridgeError::Conversion(ConversionError::TypeMismatch {
                expected: T::CLASS_NAME,
                actual: "Node",
            })
        })?;
        *slot = Some(child);
        return Ok(());
    }

    let child = Obj::<T>::new_alloc()?;
    child.set_name(&StringName::from(name))?;
    parent.add_child(&child)?;
    log::debug!("created child '{}' of class {}", name, T::CLASS_NAME);
    *slot = Some(child);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn missing_child_is_created_and_named() {
        test_support::load();
        let parent = Obj::<Node>::new_alloc().unwrap();
        let mut slot: Option<Obj<Node>> = None;
        assert_child(&parent, "Sensor", &mut slot).unwrap();

        let child = slot.clone().unwrap();
        assert_eq!(child.get_name().unwrap().to_string(), "Sensor");
        assert_eq!(parent.get_child_count().unwrap(), 1);
        parent.free().unwrap();
    }

    #[test]
    fn existing_child_is_reused() {
        test_support::load();
        let parent = Obj::<Node>::new_alloc().unwrap();
        let existing = Obj::<Node>::new_alloc().unwrap();
        existing.set_name(&StringName::from("Body")).unwrap();
        parent.add_child(&existing).unwrap();

        let mut slot: Option<Obj<Node>> = None;
        assert_child(&parent, "Body", &mut slot).unwrap();
        assert_eq!(slot, Some(existing));
        assert_eq!(parent.get_child_count().unwrap(), 1);

        // A second assertion keeps the populated slot.
        assert_child(&parent, "Body", &mut slot).unwrap();
        assert_eq!(parent.get_child_count().unwrap(), 1);
        parent.free().unwrap();
    }
}
