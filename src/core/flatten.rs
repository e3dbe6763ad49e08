//! Turns the tree into an ordered list of rows for virtualized rendering.
//!
//! The output is a pre-order walk of the tree after search and category
//! pruning, limited to the children of expanded directories. Child order is
//! always the snapshot's order; nothing is re-sorted here.

use std::collections::HashSet;

use super::search::SearchEngine;
use super::{Filter, FlattenedItem, TreeNode};

/// Inputs that decide which rows are visible.
#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions<'a> {
    /// Paths of expanded directories.
    pub expanded: &'a HashSet<String>,
    /// Lower-cased name search; empty disables searching.
    pub search_term: &'a str,
    pub filter: Option<Filter>,
    /// Media ids the user owns, consulted by [`Filter::UnknownMedia`].
    pub known_media: &'a HashSet<i64>,
}

/// Flattens the tree rooted at `root` into displayable rows.
pub fn flatten_tree<'a>(root: &'a TreeNode, options: &FlattenOptions<'_>) -> Vec<FlattenedItem<'a>> {
    let mut result = Vec::new();
    flatten_node(root, options, 0, &mut result);
    result
}

fn flatten_node<'a>(
    node: &'a TreeNode,
    options: &FlattenOptions<'_>,
    level: usize,
    result: &mut Vec<FlattenedItem<'a>>,
) {
    let searching = !options.search_term.is_empty();

    // Step 1: Narrow children by name search.
    let mut visible_children: Vec<&TreeNode> = if searching {
        node.children
            .iter()
            .filter(|child| SearchEngine::node_or_descendant_matches(child, options.search_term))
            .collect()
    } else {
        node.children.iter().collect()
    };

    // Step 2: Apply the category filter, pruning whole directories that cannot match.
    if let Some(filter) = options.filter {
        if node.is_directory() && !SearchEngine::has_matching_files(node, filter, options.known_media)
        {
            return;
        }
        visible_children
            .retain(|child| SearchEngine::child_passes_filter(child, filter, options.known_media));
    }

    // Step 3: A node stays visible during a search if it or a surviving child matches.
    let should_show = !searching
        || SearchEngine::name_matches(node, options.search_term)
        || !visible_children.is_empty();
    if !should_show {
        return;
    }

    result.push(FlattenedItem {
        node,
        level,
        index: result.len(),
    });

    if node.is_directory() && node.has_children() && options.expanded.contains(&node.path) {
        for child in visible_children {
            flatten_node(child, options, level + 1, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{dir, ignored_file, matched_file, scanned_file, unscanned_file};
    use proptest::prelude::*;

    fn sample_tree() -> TreeNode {
        dir(
            "/lib",
            vec![
                dir(
                    "/lib/Frieren",
                    vec![
                        matched_file("/lib/Frieren/Frieren - 01.mkv", 1),
                        scanned_file("/lib/Frieren/Frieren - 02.mkv"),
                        dir(
                            "/lib/Frieren/Extras",
                            vec![ignored_file("/lib/Frieren/Extras/NCOP.mkv")],
                        ),
                    ],
                ),
                dir(
                    "/lib/Mushishi",
                    vec![matched_file("/lib/Mushishi/Mushishi - 01.mkv", 2)],
                ),
                unscanned_file("/lib/notes.txt"),
            ],
        )
    }

    fn expanded(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn render(items: &[FlattenedItem<'_>]) -> String {
        items
            .iter()
            .map(|item| format!("{}{}", "  ".repeat(item.level), item.node.name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn run(
        tree: &TreeNode,
        expanded: &HashSet<String>,
        search_term: &str,
        filter: Option<Filter>,
    ) -> String {
        let known = HashSet::from([1]);
        let options = FlattenOptions {
            expanded,
            search_term,
            filter,
            known_media: &known,
        };
        render(&flatten_tree(tree, &options))
    }

    #[test]
    fn test_collapsed_root_only_shows_root() {
        let tree = sample_tree();
        assert_eq!(run(&tree, &expanded(&[]), "", None), "lib");
    }

    #[test]
    fn test_expanded_tree_is_preorder() {
        let tree = sample_tree();
        let all = expanded(&["/lib", "/lib/Frieren", "/lib/Frieren/Extras", "/lib/Mushishi"]);
        insta::assert_snapshot!(run(&tree, &all, "", None), @r"
        lib
          Frieren
            Frieren - 01.mkv
            Frieren - 02.mkv
            Extras
              NCOP.mkv
          Mushishi
            Mushishi - 01.mkv
          notes.txt
        ");
    }

    #[test]
    fn test_search_prunes_non_matching_branches() {
        let tree = sample_tree();
        let all = expanded(&["/lib", "/lib/Frieren", "/lib/Frieren/Extras", "/lib/Mushishi"]);
        insta::assert_snapshot!(run(&tree, &all, "ncop", None), @r"
        lib
          Frieren
            Extras
              NCOP.mkv
        ");
    }

    #[test]
    fn test_search_does_not_reveal_collapsed_children() {
        let tree = sample_tree();
        let only_root = expanded(&["/lib"]);
        assert_eq!(run(&tree, &only_root, "02", None), "lib\n  Frieren");
    }

    #[test]
    fn test_unmatched_filter_hides_directories_without_matches() {
        let tree = sample_tree();
        let all = expanded(&["/lib", "/lib/Frieren", "/lib/Frieren/Extras", "/lib/Mushishi"]);
        insta::assert_snapshot!(run(&tree, &all, "", Some(Filter::Unmatched)), @r"
        lib
          Frieren
            Frieren - 02.mkv
        ");
    }

    #[test]
    fn test_filter_with_no_match_anywhere_is_empty() {
        let tree = dir("/lib", vec![matched_file("/lib/a.mkv", 1)]);
        assert_eq!(run(&tree, &expanded(&["/lib"]), "", Some(Filter::Ignored)), "");
    }

    #[test]
    fn test_unknown_media_filter() {
        let tree = sample_tree();
        let all = expanded(&["/lib", "/lib/Frieren", "/lib/Mushishi"]);
        assert_eq!(
            run(&tree, &all, "", Some(Filter::UnknownMedia)),
            "lib\n  Mushishi\n    Mushishi - 01.mkv"
        );
    }

    #[test]
    fn test_indices_are_sequential() {
        let tree = sample_tree();
        let all = expanded(&["/lib", "/lib/Frieren"]);
        let known = HashSet::new();
        let options = FlattenOptions {
            expanded: &all,
            search_term: "",
            filter: None,
            known_media: &known,
        };
        let items = flatten_tree(&tree, &options);
        for (position, item) in items.iter().enumerate() {
            assert_eq!(item.index, position);
        }
    }

    #[test]
    fn test_collapsing_removes_exactly_the_descendants() {
        let tree = sample_tree();
        let all = expanded(&["/lib", "/lib/Frieren", "/lib/Frieren/Extras", "/lib/Mushishi"]);
        let mut without_frieren = all.clone();
        without_frieren.remove("/lib/Frieren");

        let known = HashSet::new();
        let paths = |expanded: &HashSet<String>| -> Vec<String> {
            let options = FlattenOptions {
                expanded,
                search_term: "",
                filter: None,
                known_media: &known,
            };
            flatten_tree(&tree, &options)
                .iter()
                .map(|item| item.node.path.clone())
                .collect()
        };

        let expected: Vec<String> = paths(&all)
            .into_iter()
            .filter(|p| !p.starts_with("/lib/Frieren/"))
            .collect();
        assert_eq!(paths(&without_frieren), expected);
    }

    /// Builds a small random tree with unique, hierarchical paths.
    fn arb_tree() -> impl Strategy<Value = TreeNode> {
        let leaf = "[a-c]{1,2}".prop_map(|name| (name, Vec::<TreeNode>::new(), false));
        let shape = leaf.prop_recursive(3, 24, 4, |inner| {
            ("[a-c]{1,2}", prop::collection::vec(inner, 0..4))
                .prop_map(|(name, kids)| {
                    let children = kids
                        .into_iter()
                        .map(|(n, c, is_dir)| {
                            if is_dir {
                                TreeNode::directory(String::new(), n, c)
                            } else {
                                TreeNode::file(String::new(), n)
                            }
                        })
                        .collect();
                    (name, children, true)
                })
        });
        shape.prop_map(|(name, children, _)| {
            let mut root = TreeNode::directory(String::new(), name, children);
            assign_paths(&mut root, "");
            root
        })
    }

    fn assign_paths(node: &mut TreeNode, prefix: &str) {
        node.path = format!("{prefix}/{}", node.name);
        let base = node.path.clone();
        for (i, child) in node.children.iter_mut().enumerate() {
            child.name = format!("{}{i}", child.name);
            assign_paths(child, &base);
        }
    }

    fn all_directories(node: &TreeNode, out: &mut HashSet<String>) {
        if node.is_directory() {
            out.insert(node.path.clone());
            for child in &node.children {
                all_directories(child, out);
            }
        }
    }

    fn preorder(node: &TreeNode, out: &mut Vec<String>) {
        out.push(node.path.clone());
        for child in &node.children {
            preorder(child, out);
        }
    }

    proptest! {
        #[test]
        fn prop_flattened_order_follows_preorder(tree in arb_tree(), term in "[a-c0-3]{0,2}") {
            let mut dirs = HashSet::new();
            all_directories(&tree, &mut dirs);
            let known = HashSet::new();
            let options = FlattenOptions {
                expanded: &dirs,
                search_term: &term,
                filter: None,
                known_media: &known,
            };
            let flattened: Vec<String> = flatten_tree(&tree, &options)
                .iter()
                .map(|item| item.node.path.clone())
                .collect();

            let mut reference = Vec::new();
            preorder(&tree, &mut reference);
            let positions: Vec<usize> = flattened
                .iter()
                .map(|p| reference.iter().position(|r| r == p).expect("flattened path exists in tree"))
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

            if term.is_empty() {
                prop_assert_eq!(flattened, reference);
            }
        }
    }
}
