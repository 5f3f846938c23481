//! Small graphs with known critical paths.

use crate::builders::GraphBuilder;
use critpath::dag::DependencyGraph;

/// `A <- B <- C <- D`, unit weights. Critical path `[A, B, C, D]`, length 4.
pub fn linear_chain() -> DependencyGraph {
    GraphBuilder::new()
        .edge("B", "A")
        .edge("C", "B")
        .edge("D", "C")
        .build()
}

/// Ids of [`fan_in`].
pub const FAN_IN_ITEMS: [&str; 7] = ["901", "902", "903", "904", "906", "907", "909"];

/// Dependency pairs of [`fan_in`], as `(dependent, dependency)`.
pub const FAN_IN_EDGES: [(&str, &str); 7] = [
    ("902", "901"),
    ("903", "902"),
    ("906", "903"),
    ("904", "901"),
    ("907", "904"),
    ("909", "906"),
    ("909", "907"),
];

/// 901 forks into `902 -> 903 -> 906` and `904 -> 907`; both branches join
/// at 909. Unit weights: critical `[901, 902, 903, 906, 909]` (length 5),
/// the other branch has slack 1.
pub fn fan_in() -> DependencyGraph {
    FAN_IN_EDGES
        .iter()
        .fold(GraphBuilder::new(), |b, (dependent, dependency)| {
            b.edge(dependent, dependency)
        })
        .build()
}

/// `layers` fully connected layers of `width` items between a single source
/// `S` and a single sink `T`: `width.pow(layers)` source-to-sink paths.
///
/// Item `L{layer}_{i}` gets weight 1, except `L0_0`, which gets weight 2 so
/// the critical paths all run through it.
pub fn lattice(width: usize, layers: usize) -> DependencyGraph {
    let mut builder = GraphBuilder::new();
    let mut previous = vec!["S".to_string()];

    for layer in 0..layers {
        let current: Vec<String> = (0..width).map(|i| format!("L{layer}_{i}")).collect();
        for item in &current {
            for dep in &previous {
                builder = builder.edge(item, dep);
            }
        }
        previous = current;
    }
    for dep in &previous {
        builder = builder.edge("T", dep);
    }

    builder.node("L0_0", 2).build()
}
