//! The dependency closure driver.
//!
//! A cook runs one generic pass and then one pass per requested platform.
//! Each pass walks the import graph level by level: every asset of the
//! current level is cooked (pooled when its backend allows, inline on the
//! driver thread otherwise), the barrier drains the batch, and the imports
//! recorded by the level's cookers seed the next level. An asset id is
//! cooked at most once per pass.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use kiln_common::{Asset, AssetId, CookError, CookResult, TargetMask};
use kiln_cooker::{BuildEnv, BuildMode, CookStatus, CookerSet};
use kiln_pack::{tag_slot, write_archive, write_package, PackError, PackageEntry};

use crate::queue::{CookCommand, CookQueue};
use crate::session::BuildSession;

impl BuildSession<'_> {
    /// Cooks the closure of `roots` and packages the output.
    pub fn cook(&self, roots: &[String]) -> CookResult<()> {
        let start = Instant::now();

        self.layout.make_build_dirs(self.opts.targets, self.opts.clean)?;
        self.log
            .line(&format!("languages: {}", self.opts.languages.fingerprint()));

        if self.opts.scripts_only {
            self.write_archives()?;
            self.log_elapsed(start);
            return Ok(());
        }

        let env = Arc::new(BuildEnv {
            layout: self.layout.clone(),
            source_root: self.source_root.clone(),
            languages: self.opts.languages,
            all_flags: self.opts.targets,
            cooking: self.opts.mode == BuildMode::Cooked,
        });

        let mut cookers = CookerSet::new();
        let queue = CookQueue::new(self.cancel.clone());

        let cooked = std::thread::scope(|scope| {
            for _ in 0..self.worker_count() {
                scope.spawn(|| queue.worker());
            }
            let result = self.cook_passes(roots, &env, &mut cookers, &queue);
            queue.shutdown();
            result
        });
        cooked?;

        if self.opts.mode == BuildMode::Cooked {
            self.build_package_data(&mut cookers)?;
            self.write_archives()?;
        }

        self.log_elapsed(start);
        Ok(())
    }

    fn cook_passes(
        &self,
        roots: &[String],
        env: &Arc<BuildEnv>,
        cookers: &mut CookerSet,
        queue: &CookQueue,
    ) -> CookResult<()> {
        let mut passes = vec![TargetMask::GENERIC];
        passes.extend(self.opts.targets.iter().map(TargetMask::only));

        for flags in passes {
            self.log.section(&format!("Cooking {flags}"));
            self.cook_pass(roots, flags, env, cookers, queue)?;
        }
        Ok(())
    }

    /// One pass: the level-by-level closure walk under fixed target flags.
    fn cook_pass(
        &self,
        roots: &[String],
        flags: TargetMask,
        env: &Arc<BuildEnv>,
        cookers: &mut CookerSet,
        queue: &CookQueue,
    ) -> CookResult<()> {
        let mut visited: HashSet<AssetId> = HashSet::new();

        let mut level: Vec<Asset> = Vec::with_capacity(roots.len());
        for root in roots {
            let asset = self.catalog.resolve(root).ok_or_else(|| {
                let err = CookError::FileNotFound(root.clone());
                self.log.error(&format!("unresolved root '{root}'"));
                err
            })?;
            level.push(asset);
        }

        while !level.is_empty() {
            if self.cancel.is_cancelled() {
                self.log.error("cook cancelled...");
                return Err(CookError::Cancelled);
            }

            let mut level_ids = Vec::new();
            let mut inline_ids = Vec::new();

            for asset in &level {
                if !visited.insert(asset.id) {
                    continue;
                }
                level_ids.push(asset.id);

                let parallel = cookers
                    .resolve_or_create(asset, self.registry, env)
                    .parallel_safe();
                if parallel {
                    let cooker = cookers.take(asset.id)?;
                    queue.enqueue(CookCommand::new(cooker, flags));
                } else {
                    inline_ids.push(asset.id);
                }
            }

            // Serialized backends run on the driver thread, before the
            // barrier so the level stays atomic.
            for id in inline_ids {
                if queue.first_error().is_some() {
                    break;
                }
                let cooker = cookers
                    .get_mut(id)
                    .ok_or_else(|| CookError::Generic("cooker disappeared".to_string()))?;
                let result = cooker.cook(flags);
                let path = cooker.asset().path.clone();
                let warnings = cooker.take_warnings();
                self.report(&path, &result, flags);
                for w in warnings {
                    self.log.warn(&w);
                }
                if let Err(err) = result {
                    queue.record_error(err);
                }
            }

            for mut cmd in queue.barrier_wait() {
                let path = cmd.cooker.asset().path.clone();
                for w in cmd.cooker.take_warnings() {
                    self.log.warn(&w);
                }
                if let Some(result) = &cmd.result {
                    self.report(&path, result, flags);
                }
                cookers.put_back(cmd.cooker);
            }

            if let Some(err) = queue.first_error() {
                return Err(err);
            }

            level = self.next_level(&level_ids, flags, cookers, &visited)?;
        }
        Ok(())
    }

    /// Expands the imports recorded by a finished level into the next one.
    fn next_level(
        &self,
        level_ids: &[AssetId],
        flags: TargetMask,
        cookers: &mut CookerSet,
        visited: &HashSet<AssetId>,
    ) -> CookResult<Vec<Asset>> {
        let mut next = Vec::new();
        for &id in level_ids {
            let Some(cooker) = cookers.get_mut(id) else {
                continue;
            };
            let referrer = cooker.asset().path.clone();
            let edges: Vec<_> = cooker
                .imports()
                .iter()
                .filter(|imp| import_matches(imp.platforms, flags))
                .map(|imp| imp.path.clone())
                .collect();

            for path in edges {
                let asset = self.catalog.resolve(&path).ok_or_else(|| {
                    self.log
                        .error(&format!("unresolved import '{path}' (imported by '{referrer}')"));
                    CookError::FileNotFound(format!("{path} (imported by {referrer})"))
                })?;
                if !visited.contains(&asset.id) {
                    next.push(asset);
                }
            }
        }
        Ok(next)
    }

    fn report(&self, path: &str, result: &CookResult<CookStatus>, flags: TargetMask) {
        match result {
            Ok(CookStatus::NeedRebuild) => self.log.line(&format!("{path} ({flags}) cooked")),
            Ok(CookStatus::UpToDate) => self.log.line(&format!("{path} ({flags}) up to date")),
            Ok(CookStatus::Ignore) => {}
            Err(err) => self
                .log
                .error(&format!("{path} ({flags}): [{}] {err}", err.code())),
        }
    }

    /// Collects every cooked asset's tags and imports into its package's
    /// lump file.
    fn build_package_data(&self, cookers: &mut CookerSet) -> CookResult<()> {
        self.log.section("Writing package data");

        let mut packages: std::collections::BTreeMap<String, Vec<PackageEntry>> =
            std::collections::BTreeMap::new();

        for cooker in cookers.iter_mut() {
            let asset = cooker.asset();
            let mut entry = PackageEntry {
                name: asset.name.clone(),
                kind: asset.kind.code(),
                target_tags: Default::default(),
                imports: cooker.imports().iter().map(|i| i.path.clone()).collect(),
            };

            entry.target_tags[tag_slot(TargetMask::GENERIC)] =
                read_optional(&self.layout.tag_path(&asset.path, TargetMask::GENERIC));
            for platform in self.opts.targets.iter() {
                let target = TargetMask::only(platform);
                entry.target_tags[tag_slot(target)] =
                    read_optional(&self.layout.tag_path(&asset.path, target));
            }

            let package = if asset.package.is_empty() {
                "base".to_string()
            } else {
                asset.package.clone()
            };
            packages.entry(package).or_default().push(entry);
        }

        for (name, entries) in packages {
            let path = self.layout.packages_dir().join(format!("{name}.lump"));
            write_package(&path, &entries).map_err(pack_to_cook)?;
            self.log
                .line(&format!("wrote package '{name}' ({} asset(s))", entries.len()));
        }
        Ok(())
    }

    /// Writes `pak0` (generic content) and one archive per target platform.
    fn write_archives(&self) -> CookResult<()> {
        self.log.section("Packaging Generics");

        let mut sources = vec![
            (self.layout.packages_dir(), "Packages/"),
            (self.layout.shaders_dir(), "Shaders/"),
        ];
        if let Some(scripts) = &self.scripts_dir {
            sources.push((scripts.clone(), "Scripts/"));
        }
        sources.push((self.layout.out_dir(TargetMask::GENERIC), "Cooked/"));

        self.log
            .with_raw(|out| {
                write_archive(
                    &self.layout.pak_path("pak0"),
                    &sources,
                    self.opts.compression,
                    out,
                )
            })
            .map_err(pack_to_cook)?;

        for platform in self.opts.targets.iter() {
            self.log.section(&format!("Packaging {}", platform.name()));
            let sources = [(
                self.layout.out_dir(TargetMask::only(platform)),
                "Cooked/",
            )];
            self.log
                .with_raw(|out| {
                    write_archive(
                        &self.layout.pak_path(platform.dir_name()),
                        &sources,
                        self.opts.compression,
                        out,
                    )
                })
                .map_err(pack_to_cook)?;
        }
        Ok(())
    }

    fn log_elapsed(&self, start: Instant) {
        self.log
            .line(&format!("cook finished in {:.1}s", start.elapsed().as_secs_f64()));
    }
}

/// An import applies to a pass when the masks intersect, or when they are
/// equal (which covers the generic pass, where both are empty).
fn import_matches(import: TargetMask, pass: TargetMask) -> bool {
    !import.intersect(pass).is_generic() || import == pass
}

fn read_optional(path: &std::path::Path) -> Option<Vec<u8>> {
    std::fs::read(path).ok()
}

fn pack_to_cook(e: PackError) -> CookError {
    CookError::Io(e.to_string())
}
