//! `Node` methods used by child assertion and scene-tree code.

use crate::builtin::{NodePath, StringName};
use crate::error::BridgeResult;
use crate::obj::Obj;

use super::{ptrcall, Inherits, Node};

impl<T: Inherits<Node>> Obj<T> {
    pub fn add_child<C: Inherits<Node>>(&self, child: &Obj<C>) -> BridgeResult<()> {
        ptrcall("Node", "add_child", self.checked_sys()?, |frame| {
            frame.arg(child.upcast_ref::<Node>())?;
            // force_readable_name, internal mode
            frame.arg(&false)?;
            frame.arg(&0i64)?;
            Ok(())
        })
    }

    pub fn get_node_or_null(&self, path: &NodePath) -> BridgeResult<Option<Obj<Node>>> {
        ptrcall("Node", "get_node_or_null", self.checked_sys()?, |frame| {
            frame.arg(path)?;
            Ok(())
        })
    }

    pub fn set_name(&self, name: &StringName) -> BridgeResult<()> {
        ptrcall("Node", "set_name", self.checked_sys()?, |frame| {
            frame.arg(name)?;
            Ok(())
        })
    }

    pub fn get_name(&self) -> BridgeResult<StringName> {
        ptrcall("Node", "get_name", self.checked_sys()?, |_| Ok(()))
    }

    pub fn get_child_count(&self) -> BridgeResult<i64> {
        ptrcall("Node", "get_child_count", self.checked_sys()?, |frame| {
            frame.arg(&false)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn children_are_found_by_name() {
        test_support::load();
        let parent = Obj::<Node>::new_alloc().unwrap();
        let child = Obj::<Node>::new_alloc().unwrap();
        child.set_name(&StringName::from("Child")).unwrap();
        assert_eq!(child.get_name().unwrap().to_string(), "Child");

        parent.add_child(&child).unwrap();
        assert_eq!(parent.get_child_count().unwrap(), 1);

        let found = parent.get_node_or_null(&NodePath::from("Child")).unwrap();
        assert_eq!(found, Some(child.clone()));
        assert_eq!(parent.get_node_or_null(&NodePath::from("Missing")).unwrap(), None);

        parent.free().unwrap();
        assert!(!child.is_valid());
    }
}
