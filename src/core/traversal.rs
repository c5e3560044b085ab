use std::future::Future;
use std::pin::Pin;

use super::analyzer::LeafCallback;
use super::node::FileNode;
use super::synthesizer::DirectorySynthesizer;
use crate::error::Result;

/// Post-order traversal engine.
///
/// Visits every child of a directory before the directory itself, invoking
/// the leaf callback on file nodes and the synthesizer on directory nodes,
/// and merging each returned result into the node. Nodes are visited exactly
/// once; siblings are processed sequentially in discovery order.
pub struct TreeTraverser {
    leaf: Box<dyn LeafCallback>,
    synthesizer: DirectorySynthesizer,
}

impl TreeTraverser {
    pub fn new(leaf: Box<dyn LeafCallback>, synthesizer: DirectorySynthesizer) -> Self {
        Self { leaf, synthesizer }
    }

    /// Run one full bottom-up pass over the tree.
    ///
    /// A backend failure anywhere aborts the pass; results already merged
    /// into visited nodes are left in place.
    pub async fn run(&self, root: &mut FileNode) -> Result<()> {
        self.visit(root).await
    }

    fn visit<'a>(
        &'a self,
        node: &'a mut FileNode,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            for child in node.children.iter_mut() {
                self.visit(child).await?;
            }

            let outcome = if node.is_directory() {
                self.synthesizer.synthesize(node).await?
            } else {
                self.leaf.analyze(node).await?
            };
            node.data.merge(outcome);

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::super::backend::testing::StaticBackend;
    use super::super::node::testing::*;
    use super::super::FileAnalyzer;
    use super::*;

    fn leaf_backed_by_file(name: &str, content: &str, dir: &tempfile::TempDir) -> FileNode {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let mut node = leaf(name);
        node.info.full_path = path;
        node
    }

    fn traverser(backend: Arc<StaticBackend>) -> TreeTraverser {
        TreeTraverser::new(
            Box::new(FileAnalyzer::new(backend.clone(), "file".to_string())),
            DirectorySynthesizer::new(backend, "dir".to_string()),
        )
    }

    #[tokio::test]
    async fn test_full_pass_accumulates_bottom_up() {
        let tmp = tempfile::tempdir().unwrap();
        let mut root = directory(
            "project",
            vec![
                directory(
                    "pkg",
                    vec![
                        leaf_backed_by_file("a.py", "print(1)", &tmp),
                        leaf_backed_by_file("b.py", "print(2)", &tmp),
                    ],
                ),
                leaf_backed_by_file("main.py", "print(3)", &tmp),
            ],
        );
        let backend = Arc::new(StaticBackend::new("analysis"));

        traverser(backend.clone()).run(&mut root).await.unwrap();

        // pkg synthesizes its two leaves at level 1, then the root combines
        // pkg (level 1) with main.py (level 0) at level 2
        assert_eq!(root.children[0].data.accumulation_level, Some(1));
        assert_eq!(root.data.accumulation_level, Some(2));
        assert_eq!(root.data.analysis.as_deref(), Some("analysis"));

        // 3 leaf calls + 2 synthesis calls
        assert_eq!(backend.call_count(), 5);
    }

    #[tokio::test]
    async fn test_single_child_directory_chain_stays_transparent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut root = directory(
            "outer",
            vec![directory(
                "inner",
                vec![leaf_backed_by_file("only.py", "print(1)", &tmp)],
            )],
        );
        let backend = Arc::new(StaticBackend::new("leaf analysis"));

        traverser(backend.clone()).run(&mut root).await.unwrap();

        // the leaf's result propagates through both directories unchanged
        assert_eq!(root.data.analysis.as_deref(), Some("leaf analysis"));
        assert_eq!(root.data.accumulation_level, None);
        assert_eq!(backend.call_count(), 1, "only the leaf call happens");
    }

    #[tokio::test]
    async fn test_ineligible_subtree_contributes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut root = directory(
            "project",
            vec![
                directory(
                    "empty_pkg",
                    vec![
                        leaf_backed_by_file("__init__.py", "x = 1", &tmp),
                        leaf_backed_by_file("blank.py", "   \n", &tmp),
                    ],
                ),
                leaf_backed_by_file("real.py", "print(1)", &tmp),
            ],
        );
        let backend = Arc::new(StaticBackend::new("analysis"));

        traverser(backend.clone()).run(&mut root).await.unwrap();

        assert!(root.children[0].data.is_empty());
        // real.py passes through the root as the only contributor
        assert_eq!(root.data.analysis.as_deref(), Some("analysis"));
        assert_eq!(root.data.accumulation_level, None);
        assert_eq!(backend.call_count(), 1);
    }
}
