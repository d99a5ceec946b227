//! End-to-end cook scenarios over a real source tree.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kiln_build::{BuildLog, BuildOptions, BuildSession, MemoryCatalog};
use kiln_common::{Asset, AssetKind, CookError, CookResult, TargetMask, TargetPlatform};
use kiln_cooker::{
    combine, CookContext, CookStatus, CookerBackend, CookerRegistry, RawCopyCooker,
};
use kiln_pack::{decode_imports, AssetTag, LumpReader, LUMP_MAGIC, LUMP_SIG, PAK_MAGIC, PAK_SIG};

/// A generic-pass backend for tests. Materials treat each line of their
/// source file as an imported asset path; everything else is copied as-is.
/// Compiles are counted so staleness behavior can be asserted.
struct ManifestBackend {
    kind: AssetKind,
    compiles: Arc<AtomicUsize>,
    fail: bool,
}

impl CookerBackend for ManifestBackend {
    fn kind(&self) -> AssetKind {
        self.kind
    }

    fn status(&mut self, ctx: &mut CookContext<'_>) -> CookResult<CookStatus> {
        if !ctx.flags.is_generic() {
            return Ok(CookStatus::Ignore);
        }
        let s = combine(ctx.compare_version(), ctx.compare_source_time());
        Ok(if s.is_stale() {
            CookStatus::NeedRebuild
        } else {
            CookStatus::UpToDate
        })
    }

    fn compile(&mut self, ctx: &mut CookContext<'_>) -> CookResult<()> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CookError::Compiler(ctx.asset.path.clone()));
        }

        let data = std::fs::read(ctx.source_path(&ctx.asset.path))?;
        if self.kind == AssetKind::Material {
            let text = String::from_utf8_lossy(&data);
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                ctx.imports.add(line.trim(), TargetMask::GENERIC);
            }
        }

        let out = ctx.output_path(&ctx.asset.path);
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&out, &data)?;
        Ok(())
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    catalog: MemoryCatalog,
    registry: CookerRegistry,
    mat_compiles: Arc<AtomicUsize>,
    raw_compiles: Arc<AtomicUsize>,
}

impl Fixture {
    fn new() -> Fixture {
        let mat_compiles = Arc::new(AtomicUsize::new(0));
        let raw_compiles = Arc::new(AtomicUsize::new(0));

        let mut registry = CookerRegistry::new();
        let counter = mat_compiles.clone();
        registry.register(AssetKind::Material, move || {
            Box::new(ManifestBackend {
                kind: AssetKind::Material,
                compiles: counter.clone(),
                fail: false,
            })
        });
        let counter = raw_compiles.clone();
        registry.register(AssetKind::Texture, move || {
            Box::new(ManifestBackend {
                kind: AssetKind::Texture,
                compiles: counter.clone(),
                fail: false,
            })
        });
        registry.register(AssetKind::Raw, || Box::new(RawCopyCooker::new()));

        Fixture {
            dir: tempfile::tempdir().unwrap(),
            catalog: MemoryCatalog::new(),
            registry,
            mat_compiles,
            raw_compiles,
        }
    }

    fn source_root(&self) -> PathBuf {
        self.dir.path().join("assets")
    }

    fn output_root(&self) -> PathBuf {
        self.dir.path().join("cooked")
    }

    fn add_source(&mut self, path: &str, kind: AssetKind, data: &[u8]) {
        let full = self.source_root().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, data).unwrap();
        self.catalog.insert(Asset::new(path, kind));
    }

    fn session(&self, opts: BuildOptions) -> BuildSession<'_> {
        BuildSession::new(
            self.output_root(),
            self.source_root(),
            &self.catalog,
            &self.registry,
            opts,
            BuildLog::sink(),
        )
    }

    fn standard_scene(&mut self) {
        self.add_source("ui/main.mat", AssetKind::Material, b"tex/a.png\ntex/b.png\n");
        self.add_source("tex/a.png", AssetKind::Texture, b"png-a");
        self.add_source("tex/b.png", AssetKind::Texture, b"png-b");
    }

    fn reset_counters(&self) {
        self.mat_compiles.store(0, Ordering::SeqCst);
        self.raw_compiles.store(0, Ordering::SeqCst);
    }
}

fn roots(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|s| s.to_string()).collect()
}

#[test]
fn closure_cooks_roots_and_imports() {
    let mut fx = Fixture::new();
    fx.standard_scene();

    let session = fx.session(BuildOptions::default());
    session.cook(&roots(&["ui/main.mat"])).unwrap();

    let generic = session.layout().out_dir(TargetMask::GENERIC);
    assert!(generic.join("ui/main.mat").exists());
    assert!(generic.join("tex/a.png").exists());
    assert!(generic.join("tex/b.png").exists());
    assert_eq!(fx.mat_compiles.load(Ordering::SeqCst), 1);
    assert_eq!(fx.raw_compiles.load(Ordering::SeqCst), 2);
}

#[test]
fn second_cook_is_idempotent() {
    let mut fx = Fixture::new();
    fx.standard_scene();

    fx.session(BuildOptions::default())
        .cook(&roots(&["ui/main.mat"]))
        .unwrap();
    fx.reset_counters();

    fx.session(BuildOptions::default())
        .cook(&roots(&["ui/main.mat"]))
        .unwrap();
    assert_eq!(fx.mat_compiles.load(Ordering::SeqCst), 0);
    assert_eq!(fx.raw_compiles.load(Ordering::SeqCst), 0);
}

#[test]
fn touching_one_import_recooks_only_it() {
    let mut fx = Fixture::new();
    fx.standard_scene();

    fx.session(BuildOptions::default())
        .cook(&roots(&["ui/main.mat"]))
        .unwrap();
    fx.reset_counters();

    // File stamps have millisecond resolution.
    std::thread::sleep(std::time::Duration::from_millis(20));
    std::fs::write(fx.source_root().join("tex/a.png"), b"png-a-v2").unwrap();

    fx.session(BuildOptions::default())
        .cook(&roots(&["ui/main.mat"]))
        .unwrap();
    assert_eq!(fx.mat_compiles.load(Ordering::SeqCst), 0);
    assert_eq!(fx.raw_compiles.load(Ordering::SeqCst), 1);
}

#[test]
fn unresolved_root_fails() {
    let fx = Fixture::new();
    let err = fx
        .session(BuildOptions::default())
        .cook(&roots(&["no/such.mat"]))
        .unwrap_err();
    assert!(matches!(err, CookError::FileNotFound(_)));
}

#[test]
fn unresolved_import_names_the_referencer() {
    let mut fx = Fixture::new();
    fx.add_source("ui/main.mat", AssetKind::Material, b"tex/missing.png\n");

    let err = fx
        .session(BuildOptions::default())
        .cook(&roots(&["ui/main.mat"]))
        .unwrap_err();
    match err {
        CookError::FileNotFound(msg) => {
            assert!(msg.contains("tex/missing.png"));
            assert!(msg.contains("ui/main.mat"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn compile_failure_short_circuits_deeper_levels() {
    let mut fx = Fixture::new();
    let fail_compiles = Arc::new(AtomicUsize::new(0));
    let counter = fail_compiles.clone();
    fx.registry.register(AssetKind::Sound, move || {
        Box::new(ManifestBackend {
            kind: AssetKind::Sound,
            compiles: counter.clone(),
            fail: true,
        })
    });

    // main.mat -> bad.snd; deep.mat -> tex/a.png would be level 2 but the
    // level 1 failure must stop the walk.
    fx.add_source("ui/main.mat", AssetKind::Material, b"snd/bad.snd\nui/deep.mat\n");
    fx.add_source("snd/bad.snd", AssetKind::Sound, b"pcm");
    fx.add_source("ui/deep.mat", AssetKind::Material, b"tex/a.png\n");
    fx.add_source("tex/a.png", AssetKind::Texture, b"png-a");

    let err = fx
        .session(BuildOptions::default())
        .cook(&roots(&["ui/main.mat"]))
        .unwrap_err();
    assert!(matches!(err, CookError::Compiler(_)));
    // The texture sits below the failing level and was never reached.
    assert_eq!(fx.raw_compiles.load(Ordering::SeqCst), 0);
}

#[test]
fn serialized_failure_stops_rest_of_level() {
    let mut fx = Fixture::new();
    let compiles = Arc::new(AtomicUsize::new(0));

    /// A driver-thread-only backend that fails for assets named `bad.*`.
    struct Serial {
        compiles: Arc<AtomicUsize>,
    }
    impl CookerBackend for Serial {
        fn kind(&self) -> AssetKind {
            AssetKind::Map
        }
        fn parallel_safe(&self) -> bool {
            false
        }
        fn status(&mut self, ctx: &mut CookContext<'_>) -> CookResult<CookStatus> {
            if !ctx.flags.is_generic() {
                return Ok(CookStatus::Ignore);
            }
            Ok(CookStatus::NeedRebuild)
        }
        fn compile(&mut self, ctx: &mut CookContext<'_>) -> CookResult<()> {
            if ctx.asset.name.starts_with("bad") {
                return Err(CookError::Compiler(ctx.asset.path.clone()));
            }
            self.compiles.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
    let counter = compiles.clone();
    fx.registry.register(AssetKind::Map, move || {
        Box::new(Serial {
            compiles: counter.clone(),
        })
    });
    fx.add_source("world/bad.map", AssetKind::Map, b"brushes");
    fx.add_source("world/ok.map", AssetKind::Map, b"brushes");

    let err = fx
        .session(BuildOptions::default())
        .cook(&roots(&["world/bad.map", "world/ok.map"]))
        .unwrap_err();
    assert!(matches!(err, CookError::Compiler(_)));
    // The second serialized asset at the same level was never compiled.
    assert_eq!(compiles.load(Ordering::SeqCst), 0);
}

#[test]
fn cancelled_before_start() {
    let mut fx = Fixture::new();
    fx.standard_scene();

    let session = fx.session(BuildOptions::default());
    session.cancel_token().cancel();
    let err = session.cook(&roots(&["ui/main.mat"])).unwrap_err();
    assert!(matches!(err, CookError::Cancelled));
}

#[test]
fn archives_hold_cooked_output_in_name_order() {
    let mut fx = Fixture::new();
    fx.standard_scene();

    let session = fx.session(BuildOptions::default());
    session.cook(&roots(&["ui/main.mat"])).unwrap();

    let pak0 = session.layout().pak_path("pak0");
    let reader =
        LumpReader::parse(PAK_SIG, PAK_MAGIC, std::fs::read(&pak0).unwrap()).unwrap();

    let names: Vec<&str> = reader.names().collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    assert!(reader.by_name("Cooked/ui/main.mat").is_some());
    assert!(reader.by_name("Cooked/tex/a.png").is_some());
    assert!(reader.by_name("Packages/ui.lump").is_some());
    assert!(reader.by_name("Packages/tex.lump").is_some());

    // The empty pc tree must not leave a pc.pak behind.
    assert!(!session.layout().pak_path("pc").exists());
}

#[test]
fn package_data_records_imports() {
    let mut fx = Fixture::new();
    fx.standard_scene();

    let session = fx.session(BuildOptions::default());
    session.cook(&roots(&["ui/main.mat"])).unwrap();

    let lump = session.layout().packages_dir().join("ui.lump");
    let reader =
        LumpReader::parse(LUMP_SIG, LUMP_MAGIC, std::fs::read(&lump).unwrap()).unwrap();

    let imports = decode_imports(reader.by_name("@imports").unwrap().tag).unwrap();
    assert_eq!(imports, vec!["tex/a.png", "tex/b.png"]);

    let tag = AssetTag::decode(reader.by_name("main.mat").unwrap().tag).unwrap();
    assert_eq!(tag.kind, AssetKind::Material.code());
    let resolved: Vec<&str> = tag
        .import_indices
        .iter()
        .map(|&i| imports[i as usize].as_str())
        .collect();
    assert_eq!(resolved, vec!["tex/a.png", "tex/b.png"]);
}

#[test]
fn incompressible_entry_is_stored_raw_end_to_end() {
    let mut fx = Fixture::new();
    let mut s = 0x9e37_79b9u32;
    let noise: Vec<u8> = (0..10_000)
        .map(|_| {
            s ^= s << 13;
            s ^= s >> 17;
            s ^= s << 5;
            (s >> 24) as u8
        })
        .collect();
    fx.add_source("blob/noise.bin", AssetKind::Texture, &noise);

    let session = fx.session(BuildOptions {
        compression: 9,
        ..BuildOptions::default()
    });
    session.cook(&roots(&["blob/noise.bin"])).unwrap();

    let pak0 = session.layout().pak_path("pak0");
    let reader =
        LumpReader::parse(PAK_SIG, PAK_MAGIC, std::fs::read(&pak0).unwrap()).unwrap();
    let lump = reader.by_name("Cooked/blob/noise.bin").unwrap();
    assert_eq!(lump.data, &noise[..]);
    assert!(lump.tag.is_empty());
}

#[test]
fn scripts_only_rebuilds_archives_without_cooking() {
    let mut fx = Fixture::new();
    fx.standard_scene();

    // First a full cook to populate the output tree.
    fx.session(BuildOptions::default())
        .cook(&roots(&["ui/main.mat"]))
        .unwrap();
    fx.reset_counters();

    let scripts = fx.dir.path().join("scripts");
    std::fs::create_dir_all(&scripts).unwrap();
    std::fs::write(scripts.join("boot.lua"), b"print('hi')").unwrap();

    let mut session = fx.session(BuildOptions {
        scripts_only: true,
        ..BuildOptions::default()
    });
    session.set_scripts_dir(scripts);
    session.cook(&[]).unwrap();

    assert_eq!(fx.mat_compiles.load(Ordering::SeqCst), 0);

    let pak0 = session.layout().pak_path("pak0");
    let reader =
        LumpReader::parse(PAK_SIG, PAK_MAGIC, std::fs::read(&pak0).unwrap()).unwrap();
    assert!(reader.by_name("Scripts/boot.lua").is_some());
    assert!(reader.by_name("Cooked/ui/main.mat").is_some());
}

#[test]
fn clean_build_discards_previous_output() {
    let mut fx = Fixture::new();
    fx.standard_scene();

    let session = fx.session(BuildOptions::default());
    session.cook(&roots(&["ui/main.mat"])).unwrap();

    let stale = session
        .layout()
        .out_dir(TargetMask::GENERIC)
        .join("leftover.bin");
    std::fs::write(&stale, b"stale").unwrap();
    fx.reset_counters();

    fx.session(BuildOptions {
        clean: true,
        ..BuildOptions::default()
    })
    .cook(&roots(&["ui/main.mat"]))
    .unwrap();

    assert!(!stale.exists());
    // Everything recooked from scratch.
    assert_eq!(fx.mat_compiles.load(Ordering::SeqCst), 1);
    assert_eq!(fx.raw_compiles.load(Ordering::SeqCst), 2);
}

#[test]
fn multi_target_build_writes_target_archives() {
    let mut fx = Fixture::new();

    /// Writes a platform-suffixed copy on platform passes.
    struct PerTarget;
    impl CookerBackend for PerTarget {
        fn kind(&self) -> AssetKind {
            AssetKind::Model
        }
        fn status(&mut self, ctx: &mut CookContext<'_>) -> CookResult<CookStatus> {
            if ctx.flags.is_generic() {
                return Ok(CookStatus::Ignore);
            }
            let s = combine(ctx.compare_version(), ctx.compare_source_time());
            Ok(if s.is_stale() {
                CookStatus::NeedRebuild
            } else {
                CookStatus::UpToDate
            })
        }
        fn compile(&mut self, ctx: &mut CookContext<'_>) -> CookResult<()> {
            let data = std::fs::read(ctx.source_path(&ctx.asset.path))?;
            let out = ctx.output_path(&ctx.asset.path);
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, data)?;
            Ok(())
        }
    }
    fx.registry
        .register(AssetKind::Model, || Box::new(PerTarget));
    fx.add_source("mdl/crate.mdl", AssetKind::Model, b"mesh");

    let targets =
        TargetMask::only(TargetPlatform::Pc).union(TargetMask::only(TargetPlatform::Ios));
    let session = fx.session(BuildOptions {
        targets,
        ..BuildOptions::default()
    });
    session.cook(&roots(&["mdl/crate.mdl"])).unwrap();

    for name in ["pc", "ios"] {
        let pak = session.layout().pak_path(name);
        let reader =
            LumpReader::parse(PAK_SIG, PAK_MAGIC, std::fs::read(&pak).unwrap()).unwrap();
        assert!(
            reader.by_name("Cooked/mdl/crate.mdl").is_some(),
            "missing cooked model in {name}.pak"
        );
    }
}

#[test]
fn shared_import_is_cooked_once() {
    let mut fx = Fixture::new();
    fx.add_source("ui/a.mat", AssetKind::Material, b"tex/shared.png\n");
    fx.add_source("ui/b.mat", AssetKind::Material, b"tex/shared.png\n");
    fx.add_source("tex/shared.png", AssetKind::Texture, b"png");

    fx.session(BuildOptions::default())
        .cook(&roots(&["ui/a.mat", "ui/b.mat"]))
        .unwrap();
    assert_eq!(fx.raw_compiles.load(Ordering::SeqCst), 1);
}

#[test]
fn diamond_closure_terminates() {
    let mut fx = Fixture::new();
    // a -> b, c; b -> d; c -> d.
    fx.add_source("m/a.mat", AssetKind::Material, b"m/b.mat\nm/c.mat\n");
    fx.add_source("m/b.mat", AssetKind::Material, b"m/d.mat\n");
    fx.add_source("m/c.mat", AssetKind::Material, b"m/d.mat\n");
    fx.add_source("m/d.mat", AssetKind::Material, b"");

    fx.session(BuildOptions::default())
        .cook(&roots(&["m/a.mat"]))
        .unwrap();
    assert_eq!(fx.mat_compiles.load(Ordering::SeqCst), 4);
}

#[test]
fn import_cycle_terminates() {
    let mut fx = Fixture::new();
    fx.add_source("m/x.mat", AssetKind::Material, b"m/y.mat\n");
    fx.add_source("m/y.mat", AssetKind::Material, b"m/x.mat\n");

    fx.session(BuildOptions::default())
        .cook(&roots(&["m/x.mat"]))
        .unwrap();
    assert_eq!(fx.mat_compiles.load(Ordering::SeqCst), 2);
}
