// src/resolver/engine.rs

//! Action resolver
//!
//! Computes the closure of packages affected by an install or uninstall
//! request and hands it to the planner for ordering.
//!
//! Install resolution propagates constraints breadth-first from the root.
//! Each id collects the ranges imposed on it by the selected packages and by
//! installed packages that are not being replaced. An installed version that
//! satisfies every range is kept; otherwise a version is selected according
//! to the dependency behavior. When a later range invalidates a selection
//! the id is re-selected and the ranges its old selection imposed are
//! withdrawn. Selections the root no longer reaches are dropped, and the
//! ranges their installed versions recorded are checked again. The root
//! itself must satisfy the ranges installed packages recorded on it.
//!
//! Uninstall resolution walks the recorded graph of the installed set: the
//! root, everything that transitively depends on it, and (optionally)
//! dependencies that were only installed for packages being removed.

use super::conflict::{Requirement, RequirementSet, describe, satisfies_all};
use super::context::{DependencyBehavior, ResolverContext};
use super::graph::{DependencyEdge, DependencyGraph};
use super::plan::{ActionPlanner, Closure, ClosureNode, PackageActionDescription, PackageActionType};
use super::select::{filter_candidates, select_version};
use crate::error::{Error, Result};
use crate::installed::InstalledSet;
use crate::package::{InstallReason, PackageMetadata, PackageName};
use crate::registry::PackageRegistry;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info};

/// Upper bound on propagation steps before giving up
pub const MAX_RESOLUTION_STEPS: usize = 100_000;

/// Resolves install and uninstall requests into action plans
pub struct ActionResolver<'a> {
    registry: &'a dyn PackageRegistry,
    installed: &'a dyn InstalledSet,
}

impl<'a> ActionResolver<'a> {
    pub fn new(
        registry: &'a dyn PackageRegistry,
        installed: &'a dyn InstalledSet,
    ) -> Self {
        Self {
            registry,
            installed,
        }
    }

    /// Resolve a request into an ordered action list
    ///
    /// An empty list means there is nothing to do.
    pub fn resolve_actions(
        &self,
        action: PackageActionType,
        root: &PackageName,
        context: &ResolverContext,
    ) -> Result<Vec<PackageActionDescription>> {
        let closure = self.resolve_closure(action, root, context)?;
        context.check_cancelled("planning")?;

        let actions = ActionPlanner::plan(&closure)?;
        info!("Resolved {} {}: {} action(s)", action, root, actions.len());
        Ok(actions)
    }

    /// Compute the unordered set of affected packages
    pub fn resolve_closure(
        &self,
        action: PackageActionType,
        root: &PackageName,
        context: &ResolverContext,
    ) -> Result<Closure> {
        match action {
            PackageActionType::Install => self.resolve_install(root, context),
            PackageActionType::Uninstall => self.resolve_uninstall(root, context),
            PackageActionType::AcceptLicense => Err(Error::InvalidRequest(
                "AcceptLicense is planned automatically and cannot be requested".to_string(),
            )),
        }
    }

    fn resolve_install(&self, root: &PackageName, context: &ResolverContext) -> Result<Closure> {
        let root_meta = self
            .registry
            .get_package(&root.id, &root.version)
            .ok_or_else(|| Error::PackageNotFound(root.to_string()))?;

        if self.installed.is_installed(&root.id, &root.version)? {
            info!("{} is already installed", root);
            return Ok(Closure::default());
        }

        let mut resolution = InstallResolution::new(self, root_meta, context)?;
        // Installed dependents of the root hold it to their ranges under every behavior
        resolution.settle_root()?;
        if context.dependency_behavior != DependencyBehavior::Ignore {
            resolution.propagate()?;
        }
        resolution.into_closure()
    }

    fn resolve_uninstall(&self, root: &PackageName, context: &ResolverContext) -> Result<Closure> {
        if !self.installed.is_installed(&root.id, &root.version)? {
            return Err(Error::PackageNotFound(format!("{root} is not installed")));
        }

        let graph = DependencyGraph::from_installed(self.installed)?;

        let mut removal: BTreeSet<String> = BTreeSet::new();
        removal.insert(root.id.clone());
        removal.extend(graph.find_breaking_packages(&root.id));
        debug!("{} and {} dependent(s) will be removed", root, removal.len() - 1);

        if context.remove_dependencies {
            loop {
                context.check_cancelled("uninstall resolution")?;

                let candidates: BTreeSet<&str> = removal
                    .iter()
                    .flat_map(|id| graph.get_dependencies(id))
                    .map(|edge| edge.to.as_str())
                    .filter(|to| !removal.contains(*to) && graph.contains(to))
                    .collect();

                let mut orphans = Vec::new();
                for id in candidates {
                    let auto = self
                        .installed
                        .get(id)?
                        .is_some_and(|p| p.reason == InstallReason::Dependency);
                    if auto
                        && graph
                            .get_dependents(id)
                            .iter()
                            .all(|dependent| removal.contains(dependent))
                    {
                        orphans.push(id.to_string());
                    }
                }

                if orphans.is_empty() {
                    break;
                }
                debug!("Removing orphaned dependencies: {}", orphans.join(", "));
                removal.extend(orphans);
            }
        }

        let subgraph = graph.subgraph(&removal);
        let uninstalls = subgraph.ids().filter_map(|id| subgraph.get_node(id)).cloned().collect();
        let uninstall_edges = subgraph
            .ids()
            .flat_map(|id| subgraph.get_dependencies(id))
            .cloned()
            .collect();

        Ok(Closure {
            installs: Vec::new(),
            uninstalls,
            install_edges: Vec::new(),
            uninstall_edges,
        })
    }
}

/// Working state of one install resolution
struct InstallResolution<'r, 'a> {
    resolver: &'r ActionResolver<'a>,
    context: &'r ResolverContext,
    root_id: String,
    /// Versions chosen for installation, by id
    selected: BTreeMap<String, PackageMetadata>,
    /// Installed ids kept at their current version
    kept: BTreeSet<String>,
    /// Ranges imposed by selected packages
    requirements: RequirementSet,
    /// Ranges recorded by installed packages
    installed_requirements: RequirementSet,
    queue: VecDeque<String>,
    steps: usize,
}

impl<'r, 'a> InstallResolution<'r, 'a> {
    fn new(
        resolver: &'r ActionResolver<'a>,
        root: PackageMetadata,
        context: &'r ResolverContext,
    ) -> Result<Self> {
        let mut installed_requirements = RequirementSet::new();
        for package in resolver.installed.get_installed()? {
            for dep in resolver.installed.dependencies_of(&package.name.id)? {
                installed_requirements.add(
                    &dep.id,
                    Requirement {
                        required_by: package.name.clone(),
                        range: dep.range,
                    },
                );
            }
        }

        let root_id = root.name.id.clone();
        let mut selected = BTreeMap::new();
        selected.insert(root_id.clone(), root);

        Ok(Self {
            resolver,
            context,
            root_id,
            selected,
            kept: BTreeSet::new(),
            requirements: RequirementSet::new(),
            installed_requirements,
            queue: VecDeque::new(),
            steps: 0,
        })
    }

    /// Breadth-first constraint propagation from the root
    fn propagate(&mut self) -> Result<()> {
        self.queue.push_back(self.root_id.clone());
        self.drain()?;
        while self.prune_unreachable()? {
            self.drain()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        while let Some(id) = self.queue.pop_front() {
            self.context.check_cancelled("dependency resolution")?;

            self.steps += 1;
            if self.steps > MAX_RESOLUTION_STEPS {
                return Err(Error::UnresolvableConstraint {
                    package: self.root_id.clone(),
                    constraints: format!(
                        "no stable selection after {MAX_RESOLUTION_STEPS} steps"
                    ),
                });
            }

            let Some(meta) = self.selected.get(&id).cloned() else {
                continue;
            };

            // Re-expanding a package replaces whatever it imposed before
            self.requirements.remove_from(&id);
            for dep in &meta.dependencies {
                self.requirements.add(
                    &dep.id,
                    Requirement {
                        required_by: meta.name.clone(),
                        range: dep.range.clone(),
                    },
                );
            }
            for dep in &meta.dependencies {
                self.settle(&dep.id)?;
            }
        }

        Ok(())
    }

    /// Drop selections the root no longer reaches
    ///
    /// A pruned id stays at its installed version, so the ranges that version
    /// recorded apply again and the ids they constrain are settled anew.
    /// Returns whether anything was dropped.
    fn prune_unreachable(&mut self) -> Result<bool> {
        let reachable: BTreeSet<String> =
            self.reachable().into_iter().map(str::to_string).collect();
        let pruned: Vec<String> = self
            .selected
            .keys()
            .filter(|id| !reachable.contains(*id))
            .cloned()
            .collect();
        if pruned.is_empty() {
            return Ok(false);
        }

        debug!("Dropping unreachable selections: {}", pruned.join(", "));
        for id in &pruned {
            self.selected.remove(id);
            self.requirements.remove_from(id);
        }

        let revived: BTreeSet<String> = pruned
            .iter()
            .flat_map(|id| self.installed_requirements.targets_of(id))
            .filter(|target| self.selected.contains_key(target) || self.kept.contains(target))
            .collect();
        for target in revived {
            self.settle(&target)?;
        }

        Ok(true)
    }

    /// Fail unless the root version satisfies every range on its id
    fn settle_root(&self) -> Result<()> {
        let active = self.active_requirements(&self.root_id);
        let root = &self.selected[&self.root_id].name;
        if satisfies_all(&root.version, active.iter().copied()) {
            return Ok(());
        }
        Err(Error::UnresolvableConstraint {
            package: root.to_string(),
            constraints: describe(active),
        })
    }

    /// Ranges currently constraining `id`
    fn active_requirements(&self, id: &str) -> Vec<&Requirement> {
        let from_installed = self
            .installed_requirements
            .for_target(id)
            .iter()
            .filter(|r| !self.selected.contains_key(&r.required_by.id));

        self.requirements
            .for_target(id)
            .iter()
            .chain(from_installed)
            .collect()
    }

    /// Make sure `id` has a version satisfying every active range
    fn settle(&mut self, id: &str) -> Result<()> {
        let active = self.active_requirements(id);

        if id == self.root_id {
            return self.settle_root();
        }

        if let Some(current) = self.selected.get(id)
            && satisfies_all(&current.name.version, active.iter().copied())
        {
            return Ok(());
        }

        if !self.selected.contains_key(id)
            && let Some(version) = self.resolver.installed.installed_version(id)?
            && satisfies_all(&version, active.iter().copied())
        {
            if self.kept.insert(id.to_string()) {
                debug!("Keeping installed {}@{}", id, version);
            }
            return Ok(());
        }

        let candidates = filter_candidates(
            self.resolver.registry.get_versions(id),
            &active,
            self.context.allow_prerelease,
        );
        let Some(version) = select_version(self.context.dependency_behavior, &candidates) else {
            return Err(Error::UnresolvableConstraint {
                package: id.to_string(),
                constraints: describe(active),
            });
        };

        let meta = self
            .resolver
            .registry
            .get_package(id, version)
            .ok_or_else(|| Error::PackageNotFound(format!("{id}@{version}")))?;
        debug!("Selected {} for {}", meta.name, describe(active));

        self.kept.remove(id);
        self.requirements.remove_from(id);
        self.selected.insert(id.to_string(), meta);
        self.queue.push_back(id.to_string());
        Ok(())
    }

    /// Selected ids reachable from the root through selected dependencies
    fn reachable(&self) -> BTreeSet<&str> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        seen.insert(self.root_id.as_str());
        queue.push_back(self.root_id.as_str());

        while let Some(id) = queue.pop_front() {
            if let Some(meta) = self.selected.get(id) {
                for dep in &meta.dependencies {
                    if let Some((key, _)) = self.selected.get_key_value(&dep.id)
                        && seen.insert(key.as_str())
                    {
                        queue.push_back(key.as_str());
                    }
                }
            }
        }

        seen
    }

    fn into_closure(self) -> Result<Closure> {
        let reachable = self.reachable();
        let installed = self.resolver.installed;
        let mut closure = Closure::default();

        for id in &reachable {
            let meta = &self.selected[*id];
            let previous = installed.get(id)?;

            let reason = if *id == self.root_id {
                InstallReason::Explicit
            } else {
                previous
                    .as_ref()
                    .map(|p| p.reason)
                    .unwrap_or(InstallReason::Dependency)
            };

            if let Some(previous) = previous {
                if previous.name == meta.name {
                    continue;
                }
                debug!("Replacing {} with {}", previous.name, meta.name);
                closure.uninstalls.push(previous.name);
            }

            closure.installs.push(ClosureNode {
                package: meta.name.clone(),
                reason,
                requires_license_acceptance: meta.requires_license_acceptance,
            });

            for dep in &meta.dependencies {
                if reachable.contains(dep.id.as_str()) {
                    closure
                        .install_edges
                        .push(DependencyEdge::new(id.to_string(), dep.id.clone(), dep.range.clone()));
                }
            }
        }

        let replaced: BTreeSet<&str> = closure.uninstalls.iter().map(|n| n.id.as_str()).collect();
        for id in &replaced {
            for dep in installed.dependencies_of(id)? {
                if replaced.contains(dep.id.as_str()) {
                    closure
                        .uninstall_edges
                        .push(DependencyEdge::new(id.to_string(), dep.id, dep.range));
                }
            }
        }

        Ok(closure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installed::MemoryInstalledSet;
    use crate::package::PackageDependency;
    use crate::registry::MemoryRegistry;
    use crate::version::VersionRange;

    fn name(s: &str) -> PackageName {
        PackageName::parse(s).unwrap()
    }

    fn meta(s: &str, deps: &[(&str, &str)]) -> PackageMetadata {
        deps.iter().fold(PackageMetadata::new(name(s)), |m, (id, range)| {
            m.with_dependency(PackageDependency::new(*id, VersionRange::parse(range).unwrap()))
        })
    }

    fn render(actions: &[PackageActionDescription]) -> Vec<String> {
        actions.iter().map(ToString::to_string).collect()
    }

    /// a@1.0, a@1.5, a@2.0; b@1.0 needs a in [1.0,2.0)
    fn sample_registry() -> MemoryRegistry {
        MemoryRegistry::new()
            .with(meta("a@1.0", &[]))
            .with(meta("a@1.5", &[]))
            .with(meta("a@2.0", &[]))
            .with(meta("b@1.0", &[("a", "[1.0,2.0)")]))
    }

    fn install(
        registry: &MemoryRegistry,
        installed: &MemoryInstalledSet,
        root: &str,
        behavior: DependencyBehavior,
    ) -> Result<Vec<PackageActionDescription>> {
        ActionResolver::new(registry, installed).resolve_actions(
            PackageActionType::Install,
            &name(root),
            &ResolverContext::new(behavior),
        )
    }

    fn apply(
        installed: &mut MemoryInstalledSet,
        registry: &MemoryRegistry,
        actions: &[PackageActionDescription],
    ) {
        for action in actions {
            match action.action_type {
                PackageActionType::Install => {
                    let deps = registry
                        .get_package(&action.package.id, &action.package.version)
                        .unwrap()
                        .dependencies;
                    installed.record_install(&action.package, &deps, action.reason).unwrap();
                }
                PackageActionType::Uninstall => installed.record_uninstall(&action.package).unwrap(),
                PackageActionType::AcceptLicense => {}
            }
        }
    }

    #[test]
    fn test_install_lowest_and_highest() {
        let registry = sample_registry();
        let installed = MemoryInstalledSet::new();

        let lowest = install(&registry, &installed, "b@1.0", DependencyBehavior::Lowest).unwrap();
        assert_eq!(render(&lowest), vec!["Install a@1.0.0", "Install b@1.0.0"]);
        assert_eq!(lowest[0].reason, InstallReason::Dependency);
        assert_eq!(lowest[1].reason, InstallReason::Explicit);

        let highest = install(&registry, &installed, "b@1.0", DependencyBehavior::Highest).unwrap();
        assert_eq!(render(&highest), vec!["Install a@1.5.0", "Install b@1.0.0"]);
    }

    #[test]
    fn test_install_ignore_dependencies() {
        let registry = sample_registry();
        let installed = MemoryInstalledSet::new();
        let actions = install(&registry, &installed, "b@1.0", DependencyBehavior::Ignore).unwrap();
        assert_eq!(render(&actions), vec!["Install b@1.0.0"]);
    }

    #[test]
    fn test_install_keeps_satisfying_installed_version() {
        let registry = sample_registry();
        let mut installed = MemoryInstalledSet::new();
        installed
            .record_install(&name("a@1.5"), &[], InstallReason::Explicit)
            .unwrap();

        let actions = install(&registry, &installed, "b@1.0", DependencyBehavior::Highest).unwrap();
        assert_eq!(render(&actions), vec!["Install b@1.0.0"]);
    }

    #[test]
    fn test_install_upgrades_unsatisfying_installed_version() {
        let registry = sample_registry();
        let mut installed = MemoryInstalledSet::new();
        installed
            .record_install(&name("a@2.0"), &[], InstallReason::Explicit)
            .unwrap();

        let actions = install(&registry, &installed, "b@1.0", DependencyBehavior::Lowest).unwrap();
        assert_eq!(
            render(&actions),
            vec!["Uninstall a@2.0.0", "Install a@1.0.0", "Install b@1.0.0"]
        );
        // The replaced package keeps its original reason
        assert_eq!(actions[1].reason, InstallReason::Explicit);
    }

    #[test]
    fn test_install_respects_installed_dependents() {
        // c@1.0 is installed and needs a < 1.5; installing b must not pick a@1.5
        let registry = sample_registry().with(meta("c@1.0", &[("a", "< 1.5")]));
        let mut installed = MemoryInstalledSet::new();
        installed
            .record_install(&name("a@1.0"), &[], InstallReason::Dependency)
            .unwrap();
        installed
            .record_install(
                &name("c@1.0"),
                &[PackageDependency::new("a", VersionRange::parse("< 1.5").unwrap())],
                InstallReason::Explicit,
            )
            .unwrap();

        let actions = install(&registry, &installed, "b@1.0", DependencyBehavior::Highest).unwrap();
        assert_eq!(render(&actions), vec!["Install b@1.0.0"]);
    }

    #[test]
    fn test_reselection_drops_stale_requirements() {
        // root needs x (any) and y; y needs x >= 2.0. x@1.0 needs z, x@2.0 doesn't.
        let registry = MemoryRegistry::new()
            .with(meta("root@1.0", &[("x", "*"), ("y", "*")]))
            .with(meta("x@1.0", &[("z", "*")]))
            .with(meta("x@2.0", &[]))
            .with(meta("y@1.0", &[("x", ">= 2.0")]))
            .with(meta("z@1.0", &[]));
        let installed = MemoryInstalledSet::new();

        let actions = install(&registry, &installed, "root@1.0", DependencyBehavior::Lowest).unwrap();
        assert_eq!(
            render(&actions),
            vec!["Install x@2.0.0", "Install y@1.0.0", "Install root@1.0.0"]
        );
    }

    #[test]
    fn test_root_upgrade_respects_installed_dependents() {
        let registry = sample_registry();
        let mut installed = MemoryInstalledSet::new();
        installed
            .record_install(&name("a@1.0"), &[], InstallReason::Dependency)
            .unwrap();
        installed
            .record_install(
                &name("b@1.0"),
                &[PackageDependency::new("a", VersionRange::parse("[1.0,2.0)").unwrap())],
                InstallReason::Explicit,
            )
            .unwrap();

        for behavior in [DependencyBehavior::Lowest, DependencyBehavior::Ignore] {
            match install(&registry, &installed, "a@2.0", behavior) {
                Err(Error::UnresolvableConstraint { package, constraints }) => {
                    assert_eq!(package, "a@2.0.0");
                    assert!(constraints.contains("b@1.0.0"), "{constraints}");
                }
                other => panic!("{behavior}: expected unresolvable constraint, got {other:?}"),
            }
        }

        // An upgrade inside b's range is still allowed
        let actions = install(&registry, &installed, "a@1.5", DependencyBehavior::Ignore).unwrap();
        assert_eq!(render(&actions), vec!["Uninstall a@1.0.0", "Install a@1.5.0"]);
    }

    #[test]
    fn test_pruned_selection_restores_installed_ranges() {
        // p@1.0 is installed and needs q < 2.0. x@1.0 would upgrade p, but y
        // moves x to 2.0, so p stays at 1.0 while y still asks for q >= 2.0.
        let registry = MemoryRegistry::new()
            .with(meta("root@1.0", &[("x", "*"), ("y", "*")]))
            .with(meta("x@1.0", &[("p", ">= 2.0")]))
            .with(meta("x@2.0", &[]))
            .with(meta("y@1.0", &[("x", ">= 2.0"), ("q", ">= 2.0")]))
            .with(meta("p@1.0", &[("q", "< 2.0")]))
            .with(meta("p@2.0", &[]))
            .with(meta("q@1.0", &[]))
            .with(meta("q@2.0", &[]));
        let mut installed = MemoryInstalledSet::new();
        installed
            .record_install(&name("q@1.0"), &[], InstallReason::Dependency)
            .unwrap();
        installed
            .record_install(
                &name("p@1.0"),
                &[PackageDependency::new("q", VersionRange::parse("< 2.0").unwrap())],
                InstallReason::Explicit,
            )
            .unwrap();

        match install(&registry, &installed, "root@1.0", DependencyBehavior::Lowest) {
            Err(Error::UnresolvableConstraint { package, constraints }) => {
                assert_eq!(package, "q");
                assert!(constraints.contains("p@1.0.0"), "{constraints}");
                assert!(constraints.contains("y@1.0.0"), "{constraints}");
            }
            other => panic!("expected unresolvable constraint, got {other:?}"),
        }
    }

    #[test]
    fn test_pruned_selection_keeps_compatible_plan() {
        // Same shape, but y accepts any q: the pruned p upgrade leaves q alone
        let registry = MemoryRegistry::new()
            .with(meta("root@1.0", &[("x", "*"), ("y", "*")]))
            .with(meta("x@1.0", &[("p", ">= 2.0")]))
            .with(meta("x@2.0", &[]))
            .with(meta("y@1.0", &[("x", ">= 2.0"), ("q", "*")]))
            .with(meta("p@1.0", &[("q", "< 2.0")]))
            .with(meta("p@2.0", &[]))
            .with(meta("q@1.0", &[]))
            .with(meta("q@2.0", &[]));
        let mut installed = MemoryInstalledSet::new();
        installed
            .record_install(&name("q@1.0"), &[], InstallReason::Dependency)
            .unwrap();
        installed
            .record_install(
                &name("p@1.0"),
                &[PackageDependency::new("q", VersionRange::parse("< 2.0").unwrap())],
                InstallReason::Explicit,
            )
            .unwrap();

        let actions = install(&registry, &installed, "root@1.0", DependencyBehavior::Lowest).unwrap();
        assert_eq!(
            render(&actions),
            vec!["Install x@2.0.0", "Install y@1.0.0", "Install root@1.0.0"]
        );
    }

    #[test]
    fn test_install_unresolvable() {
        let registry = sample_registry().with(meta("c@1.0", &[("a", ">= 3.0")]));
        let installed = MemoryInstalledSet::new();

        match install(&registry, &installed, "c@1.0", DependencyBehavior::Lowest) {
            Err(Error::UnresolvableConstraint { package, constraints }) => {
                assert_eq!(package, "a");
                assert!(constraints.contains("c@1.0.0"));
            }
            other => panic!("expected unresolvable constraint, got {other:?}"),
        }

        let registry = MemoryRegistry::new().with(meta("d@1.0", &[("missing", "*")]));
        assert!(matches!(
            install(&registry, &installed, "d@1.0", DependencyBehavior::Lowest),
            Err(Error::UnresolvableConstraint { .. })
        ));
    }

    #[test]
    fn test_install_unknown_root() {
        let registry = sample_registry();
        let installed = MemoryInstalledSet::new();
        assert!(matches!(
            install(&registry, &installed, "nope@1.0", DependencyBehavior::Lowest),
            Err(Error::PackageNotFound(_))
        ));
    }

    #[test]
    fn test_install_already_installed_is_empty() {
        let registry = sample_registry();
        let mut installed = MemoryInstalledSet::new();
        installed
            .record_install(&name("a@1.0"), &[], InstallReason::Explicit)
            .unwrap();
        assert!(install(&registry, &installed, "a@1.0", DependencyBehavior::Lowest)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_install_cycle() {
        let registry = MemoryRegistry::new()
            .with(meta("p@1.0", &[("q", "*")]))
            .with(meta("q@1.0", &[("p", "*")]));
        let installed = MemoryInstalledSet::new();
        assert!(matches!(
            install(&registry, &installed, "p@1.0", DependencyBehavior::Lowest),
            Err(Error::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_root_constrained_by_dependency_cycle() {
        // q requires p >= 2.0 but the root is p@1.0
        let registry = MemoryRegistry::new()
            .with(meta("p@1.0", &[("q", "*")]))
            .with(meta("q@1.0", &[("p", ">= 2.0")]));
        let installed = MemoryInstalledSet::new();
        assert!(matches!(
            install(&registry, &installed, "p@1.0", DependencyBehavior::Lowest),
            Err(Error::UnresolvableConstraint { .. })
        ));
    }

    #[test]
    fn test_license_action_placement() {
        let registry = MemoryRegistry::new()
            .with(meta("lib@1.0", &[]).with_license_acceptance(true))
            .with(meta("app@1.0", &[("lib", "*")]));
        let installed = MemoryInstalledSet::new();

        let actions = install(&registry, &installed, "app@1.0", DependencyBehavior::Lowest).unwrap();
        assert_eq!(
            render(&actions),
            vec!["AcceptLicense lib@1.0.0", "Install lib@1.0.0", "Install app@1.0.0"]
        );
    }

    #[test]
    fn test_uninstall_includes_dependents_and_orphans() {
        let registry = sample_registry();
        let mut installed = MemoryInstalledSet::new();
        let plan = install(&registry, &installed, "b@1.0", DependencyBehavior::Lowest).unwrap();
        apply(&mut installed, &registry, &plan);

        let resolver = ActionResolver::new(&registry, &installed);
        let removal = resolver
            .resolve_actions(PackageActionType::Uninstall, &name("a@1.0"), &ResolverContext::default())
            .unwrap();
        assert_eq!(render(&removal), vec!["Uninstall b@1.0.0", "Uninstall a@1.0.0"]);

        // Removing b alone also removes a, which was only installed for b
        let removal = resolver
            .resolve_actions(PackageActionType::Uninstall, &name("b@1.0"), &ResolverContext::default())
            .unwrap();
        assert_eq!(render(&removal), vec!["Uninstall b@1.0.0", "Uninstall a@1.0.0"]);

        let keep_deps = ResolverContext::default().with_remove_dependencies(false);
        let removal = resolver
            .resolve_actions(PackageActionType::Uninstall, &name("b@1.0"), &keep_deps)
            .unwrap();
        assert_eq!(render(&removal), vec!["Uninstall b@1.0.0"]);
    }

    #[test]
    fn test_uninstall_keeps_shared_and_explicit_dependencies() {
        let registry = sample_registry().with(meta("c@1.0", &[("a", "*")]));
        let mut installed = MemoryInstalledSet::new();
        for root in ["b@1.0", "c@1.0"] {
            let plan = install(&registry, &installed, root, DependencyBehavior::Lowest).unwrap();
            apply(&mut installed, &registry, &plan);
        }

        let resolver = ActionResolver::new(&registry, &installed);
        let removal = resolver
            .resolve_actions(PackageActionType::Uninstall, &name("b@1.0"), &ResolverContext::default())
            .unwrap();
        assert_eq!(render(&removal), vec!["Uninstall b@1.0.0"]);
    }

    #[test]
    fn test_uninstall_not_installed() {
        let registry = sample_registry();
        let installed = MemoryInstalledSet::new();
        let resolver = ActionResolver::new(&registry, &installed);
        assert!(matches!(
            resolver.resolve_actions(
                PackageActionType::Uninstall,
                &name("a@1.0"),
                &ResolverContext::default()
            ),
            Err(Error::PackageNotFound(_))
        ));
    }

    #[test]
    fn test_accept_license_not_requestable() {
        let registry = sample_registry();
        let installed = MemoryInstalledSet::new();
        let resolver = ActionResolver::new(&registry, &installed);
        assert!(matches!(
            resolver.resolve_actions(
                PackageActionType::AcceptLicense,
                &name("a@1.0"),
                &ResolverContext::default()
            ),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_cancelled_resolution() {
        use std::sync::Arc;
        use std::sync::atomic::AtomicBool;

        let registry = sample_registry();
        let installed = MemoryInstalledSet::new();
        let context = ResolverContext::default().with_cancel(Arc::new(AtomicBool::new(true)));
        assert!(matches!(
            ActionResolver::new(&registry, &installed).resolve_actions(
                PackageActionType::Install,
                &name("b@1.0"),
                &context
            ),
            Err(Error::Cancelled(_))
        ));
    }
}
