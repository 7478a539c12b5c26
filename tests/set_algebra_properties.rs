//! Set-algebra laws of the assignment operators, checked over random command
//! sequences.
//!
//! The tree is fixed (every bundle has the same controllers, every controller
//! the same actions) so that a name list drawn for one level is valid at that
//! level wherever the scope points.

use gatekeep::{Assignments, Builder, Error, RouteKey, Selection};
use proptest::prelude::*;
use proptest::sample::subsequence;

const BUNDLES: [&str; 3] = ["b0", "b1", "b2"];
const CONTROLLERS: [&str; 2] = ["c0", "c1"];
const ACTIONS: [&str; 3] = ["a0", "a1", "a2"];
const MIDDLEWARES: [&str; 3] = ["m0", "m1", "m2"];

#[derive(Clone, Copy, Debug)]
enum Level {
    Bundle,
    Controller,
    Action,
}

impl Level {
    fn universe(self) -> &'static [&'static str] {
        match self {
            Level::Bundle => &BUNDLES,
            Level::Controller => &CONTROLLERS,
            Level::Action => &ACTIONS,
        }
    }

    fn complement(self, names: &[&'static str]) -> Vec<&'static str> {
        self.universe()
            .iter()
            .copied()
            .filter(|n| !names.contains(n))
            .collect()
    }

    /// Whether `route` lies inside the named set at this level, for the
    /// scope the commands run in.
    fn covers(self, route: &RouteKey, names: &[&str], scope: (&str, &str)) -> bool {
        match self {
            Level::Bundle => names.contains(&route.bundle()),
            Level::Controller => route.bundle() == scope.0 && names.contains(&route.controller()),
            Level::Action => {
                route.bundle() == scope.0
                    && route.controller() == scope.1
                    && names.contains(&route.action())
            }
        }
    }
}

#[derive(Clone, Debug)]
enum Command {
    All(Level),
    Only(Level, Vec<&'static str>),
    Except(Level, Vec<&'static str>),
}

fn level() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::Bundle), Just(Level::Controller), Just(Level::Action)]
}

fn level_with_names() -> impl Strategy<Value = (Level, Vec<&'static str>)> {
    level().prop_flat_map(|level| {
        let universe = level.universe().to_vec();
        let max = universe.len();
        subsequence(universe, 0..=max).prop_map(move |names| (level, names))
    })
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        level().prop_map(Command::All),
        level_with_names().prop_map(|(l, n)| Command::Only(l, n)),
        level_with_names().prop_map(|(l, n)| Command::Except(l, n)),
    ]
}

fn scope() -> impl Strategy<Value = (&'static str, &'static str)> {
    (prop::sample::select(BUNDLES.to_vec()), prop::sample::select(CONTROLLERS.to_vec()))
}

fn builder() -> Builder<()> {
    let mut b = Builder::new();
    for bundle in BUNDLES {
        for controller in CONTROLLERS {
            b.register_controller(bundle, controller, ACTIONS).unwrap();
        }
    }
    for m in MIDDLEWARES {
        b.register_middleware(m, || ()).unwrap();
    }
    b
}

fn run(selection: Selection<'_>, command: &Command) -> Result<(), Error> {
    match command {
        Command::All(Level::Bundle) => drop(selection.all_bundles()),
        Command::All(Level::Controller) => drop(selection.all_controllers()?),
        Command::All(Level::Action) => drop(selection.all_actions()?),
        Command::Only(Level::Bundle, n) => drop(selection.only_bundles(n)?),
        Command::Only(Level::Controller, n) => drop(selection.only_controllers(n)?),
        Command::Only(Level::Action, n) => drop(selection.only_actions(n)?),
        Command::Except(Level::Bundle, n) => drop(selection.except_bundles(n)?),
        Command::Except(Level::Controller, n) => drop(selection.except_controllers(n)?),
        Command::Except(Level::Action, n) => drop(selection.except_actions(n)?),
    }
    Ok(())
}

fn issue(b: &mut Builder<()>, scope: (&str, &str), middleware: &str, command: &Command) {
    let mut session = b.scope(scope.0, scope.1);
    run(session.select(middleware).unwrap(), command).unwrap();
}

fn snapshot(a: &Assignments) -> Vec<(String, Vec<String>)> {
    a.routes()
        .map(|r| {
            let ms = a.middlewares(&r).map(str::to_owned).collect();
            (r.to_string(), ms)
        })
        .collect()
}

fn history() -> impl Strategy<Value = Vec<(usize, Command)>> {
    prop::collection::vec((0..MIDDLEWARES.len(), command()), 0..8)
}

proptest! {
    #[test]
    fn prop_repeating_a_command_is_idempotent(
        scope in scope(),
        prior in history(),
        command in command(),
    ) {
        let mut b = builder();
        for (m, c) in &prior {
            issue(&mut b, scope, MIDDLEWARES[*m], c);
        }
        issue(&mut b, scope, "m0", &command);
        let once = snapshot(b.assignments());
        issue(&mut b, scope, "m0", &command);
        prop_assert_eq!(once, snapshot(b.assignments()));
    }

    #[test]
    fn prop_only_then_except_clears_named_side(
        scope in scope(),
        prior in history(),
        (level, names) in level_with_names(),
    ) {
        let mut b = builder();
        for (m, c) in &prior {
            issue(&mut b, scope, MIDDLEWARES[*m], c);
        }
        issue(&mut b, scope, "m0", &Command::Only(level, names.clone()));
        issue(&mut b, scope, "m0", &Command::Except(level, names.clone()));

        let a = b.assignments();
        for route in a.routes() {
            let carried = a.middlewares(&route).any(|m| m == "m0");
            if level.covers(&route, &names, scope) {
                prop_assert!(!carried, "{} still carries m0", route);
            }
        }
    }

    #[test]
    fn prop_except_complement_matches_only(
        scope in scope(),
        prior in history(),
        (level, names) in level_with_names(),
    ) {
        let mut only = builder();
        let mut both = builder();
        for (m, c) in &prior {
            issue(&mut only, scope, MIDDLEWARES[*m], c);
            issue(&mut both, scope, MIDDLEWARES[*m], c);
        }

        issue(&mut only, scope, "m0", &Command::Only(level, names.clone()));
        issue(&mut both, scope, "m0", &Command::Only(level, names.clone()));
        issue(&mut both, scope, "m0", &Command::Except(level, level.complement(&names)));

        prop_assert_eq!(snapshot(only.assignments()), snapshot(both.assignments()));
    }

    #[test]
    fn prop_unknown_bundle_leaves_state_untouched(
        scope in scope(),
        prior in history(),
        names in subsequence(BUNDLES.to_vec(), 0..=BUNDLES.len()),
    ) {
        let mut b = builder();
        for (m, c) in &prior {
            issue(&mut b, scope, MIDDLEWARES[*m], c);
        }
        let before = snapshot(b.assignments());

        let mut names = names;
        names.push("nonexistent");
        let err = b.select("m0").unwrap().only_bundles(&names).err();
        prop_assert!(matches!(err, Some(Error::UnknownScope { .. })), "unexpected {:?}", err);
        prop_assert_eq!(before, snapshot(b.assignments()));
    }

    #[test]
    fn prop_resolution_is_sorted_by_priority(
        priorities in prop::collection::vec(-3i32..=3, 1..6),
    ) {
        let mut b: Builder<()> = Builder::new();
        b.register_controller("app", "home", ["index"]).unwrap();
        let names: Vec<String> = (0..priorities.len()).map(|i| format!("p{i}")).collect();
        for (name, priority) in names.iter().zip(&priorities) {
            b.register_middleware_with_priority(name, || (), *priority).unwrap();
        }
        // Assign in reverse so assignment order cannot explain the result.
        for name in names.iter().rev() {
            b.select(name).unwrap().all_bundles();
        }

        let r = b.freeze();
        let resolved = r.resolve_path("app.home.index").unwrap();
        prop_assert_eq!(resolved.len(), names.len());

        let ranked: Vec<(i32, usize)> = resolved
            .iter()
            .map(|m| {
                let seq = names.iter().position(|n| n == m).unwrap();
                (r.registry().priority(m), seq)
            })
            .collect();
        for pair in ranked.windows(2) {
            let ((p0, s0), (p1, s1)) = (pair[0], pair[1]);
            prop_assert!(p0 > p1 || (p0 == p1 && s0 < s1), "{:?}", ranked);
        }
    }
}

#[test]
fn all_bundles_then_except_action_spares_siblings() {
    let mut b = builder();
    b.select("m0").unwrap().all_bundles();
    b.scope("b0", "c0").select("m0").unwrap().except_actions(["a1"]).unwrap();

    let r = b.freeze();
    assert!(!r.resolve_path("b0.c0.a1").unwrap().contains(&"m0".to_owned()));
    for sibling in ["b0.c0.a0", "b0.c0.a2", "b0.c1.a1", "b2.c0.a1"] {
        assert_eq!(&*r.resolve_path(sibling).unwrap(), ["m0"], "{sibling}");
    }
}
