use pointer_resolver_types::SymbolKind;
use tree_sitter::{Node, Point, Tree};

/// Finds the node defining `name` as `kind`.
///
/// With a line hint the search starts from the smallest node at the first
/// non-blank column of that line and climbs towards the root; when no
/// ancestor qualifies, the declaration beginning on the hinted line is
/// searched top-down (this is what finds the struct inside
/// `typedef struct Point {...} Point;`). A hint of 0 means the line is
/// unknown and the whole tree is searched in document order.
pub fn find_definition<'t>(
    tree: &'t Tree,
    source: &[u8],
    kind: SymbolKind,
    name: &str,
    line_hint: usize,
) -> Option<Node<'t>> {
    let root = tree.root_node();
    let defines = |node: Node<'_>| defines_symbol(node, source, kind, name);

    if line_hint == 0 {
        return first_in_subtree(root, &defines);
    }

    let seed = seed_at_line(root, source, line_hint)?;

    let mut line_root = None;
    let mut current = Some(seed);
    while let Some(node) = current {
        if defines(node) {
            return Some(node);
        }
        if node.start_position().row == line_hint && node.id() != root.id() {
            line_root = Some(node);
        }
        current = node.parent();
    }

    line_root.and_then(|node| first_in_subtree(node, &defines))
}

fn seed_at_line<'t>(root: Node<'t>, source: &[u8], line: usize) -> Option<Node<'t>> {
    let line_start = line_offset(source, line)?;
    let column = source[line_start..]
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();
    let point = Point::new(line, column);
    root.descendant_for_point_range(point, point)
}

fn line_offset(source: &[u8], line: usize) -> Option<usize> {
    if line == 0 {
        return Some(0);
    }
    source
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'\n')
        .nth(line - 1)
        .map(|(idx, _)| idx + 1)
        .filter(|&offset| offset < source.len())
}

fn first_in_subtree<'t, F>(node: Node<'t>, predicate: &F) -> Option<Node<'t>>
where
    F: Fn(Node<'t>) -> bool,
{
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if predicate(current) {
            return Some(current);
        }

        let mut cursor = current.walk();
        let children: Vec<_> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

fn defines_symbol(node: Node<'_>, source: &[u8], kind: SymbolKind, name: &str) -> bool {
    match kind {
        SymbolKind::Function => is_function_named(node, source, name),
        SymbolKind::Typedef => is_typedef_named(node, source, name),
        SymbolKind::Struct => is_specifier_named(node, source, "struct_specifier", name),
        SymbolKind::Enum => is_specifier_named(node, source, "enum_specifier", name),
        SymbolKind::Macro | SymbolKind::Global => false,
    }
}

fn is_function_named(node: Node<'_>, source: &[u8], name: &str) -> bool {
    node.kind() == "function_definition"
        && node
            .child_by_field_name("declarator")
            .and_then(declared_identifier)
            .map(|ident| identifier_matches(ident, source, name))
            .unwrap_or(false)
}

fn is_typedef_named(node: Node<'_>, source: &[u8], name: &str) -> bool {
    match node.kind() {
        "type_definition" => {
            let mut cursor = node.walk();
            node.children_by_field_name("declarator", &mut cursor)
                .filter_map(declared_identifier)
                .any(|ident| identifier_matches(ident, source, name))
        }
        // C++ `using Alias = T;`
        "alias_declaration" => node
            .child_by_field_name("name")
            .map(|ident| identifier_matches(ident, source, name))
            .unwrap_or(false),
        _ => false,
    }
}

// Only specifiers with a body count; `struct Point *p;` merely uses the tag.
fn is_specifier_named(node: Node<'_>, source: &[u8], specifier: &str, name: &str) -> bool {
    node.kind() == specifier
        && node.child_by_field_name("body").is_some()
        && node
            .child_by_field_name("name")
            .map(|ident| identifier_matches(ident, source, name))
            .unwrap_or(false)
}

/// Follows a declarator chain (pointer, array, function, parenthesized ...)
/// down to the identifier it declares. Parameter lists are never entered.
fn declared_identifier(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        match current.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "primitive_type"
            | "qualified_identifier" | "destructor_name" | "operator_name" => {
                return Some(current);
            }
            _ => {
                current = current
                    .child_by_field_name("declarator")
                    .or_else(|| current.named_child(0))?;
            }
        }
    }
}

fn identifier_matches(node: Node<'_>, source: &[u8], name: &str) -> bool {
    if node.utf8_text(source).map(|text| text == name).unwrap_or(false) {
        return true;
    }
    // `int Widget::draw()` answers to `draw` as well as `Widget::draw`.
    node.kind() == "qualified_identifier"
        && node
            .child_by_field_name("name")
            .map(|inner| identifier_matches(inner, source, name))
            .unwrap_or(false)
}
