use std::fs;
use std::path::Path;

use regex::Regex;
use sha2::{Digest, Sha256};
use speculate2::speculate;
use tempfile::TempDir;
use xcpatch::config::Config;
use xcpatch::outcome::Status;
use xcpatch::pipeline::{self, Mode, Patch};
use xcpatch::sources::{self, ScanOptions, SourcesPatch};
use xcpatch_core::Document;

const FIXTURE: &str = include_str!("fixtures/project.pbxproj");
const SOURCES_PHASE: &str = "96FE1F5D2C2DE6AA006D0C8B";
const TESTS_SOURCES_PHASE: &str = "96FE1F712C2DE6AA006D0C8B";

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("file has a parent")).expect("Failed to create dir");
    fs::write(path, "import SwiftUI\n").expect("Failed to write file");
}

/// A checkout with `Bitkit.xcodeproj` next to a `Bitkit` source tree.
fn create_checkout() -> (TempDir, Config) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let project = dir.path().join("Bitkit.xcodeproj/project.pbxproj");
    fs::create_dir_all(project.parent().unwrap()).expect("Failed to create xcodeproj");
    fs::write(&project, FIXTURE).expect("Failed to write project");

    let src = dir.path().join("Bitkit");
    touch(&src, "Models/A.swift");
    touch(&src, "Views/B.swift");
    touch(&src, "Preview Content/C.swift");
    touch(&src, "Views/README.md");

    let mut config = Config::default();
    config.project = project;
    config.sources.root = src;
    (dir, config)
}

fn digest(path: &Path) -> Vec<u8> {
    Sha256::digest(fs::read(path).expect("Failed to read project")).to_vec()
}

fn phase_files(doc: &Document, phase: &str) -> Vec<String> {
    doc.object(phase)
        .expect("phase exists")
        .list("files")
        .into_iter()
        .map(String::from)
        .collect()
}

speculate! {
    before {
        let (dir, config) = create_checkout();
    }

    describe "scan" {
        it "skips excluded subtrees and sorts relative to the source root" {
            let options = ScanOptions {
                root: config.sources.root.clone(),
                base: config.sources.root.clone(),
                extension: "swift".to_string(),
                exclude: vec!["Preview Content".to_string()],
            };

            let files = sources::scan(&options).expect("Scan failed");
            assert_eq!(files, vec!["Models/A.swift", "Views/B.swift"]);
        }

        it "writes paths relative to SOURCE_ROOT by default" {
            let files = sources::scan(&ScanOptions::from_config(&config)).expect("Scan failed");
            assert_eq!(files, vec!["Bitkit/Models/A.swift", "Bitkit/Views/B.swift"]);
        }

        it "excludes nested directories by name" {
            touch(&config.sources.root, "Views/Preview Content/D.swift");
            touch(&config.sources.root, "Views/Previews/E.swift");

            let files = sources::scan(&ScanOptions::from_config(&config)).expect("Scan failed");
            assert!(!files.iter().any(|f| f.contains("Preview Content")));
            assert!(files.contains(&"Bitkit/Views/Previews/E.swift".to_string()));
        }

        it "sorts lexicographically regardless of walk order" {
            touch(&config.sources.root, "App.swift");
            touch(&config.sources.root, "Zeta/Z.swift");
            touch(&config.sources.root, "Models/Sub/0.swift");

            let files = sources::scan(&ScanOptions::from_config(&config)).expect("Scan failed");
            let mut sorted = files.clone();
            sorted.sort();
            assert_eq!(files, sorted);
            assert_eq!(files.len(), 5);
        }

        it "fails when the root does not exist" {
            let mut options = ScanOptions::from_config(&config);
            options.root = dir.path().join("Missing");
            assert!(sources::scan(&options).is_err());
        }
    }

    describe "run" {
        it "registers every scanned file with the app target" {
            let patch = SourcesPatch::from_config(&config).expect("Failed to build patch");
            let outcome = pipeline::run(&config.project, &patch, Mode::Write).expect("Run failed");
            assert_eq!(outcome.status, Status::Applied);
            assert_eq!(outcome.entities.len(), 2);

            let text = fs::read_to_string(&config.project).expect("Failed to read project");
            let doc = Document::parse(text.clone()).expect("Patched project must parse");

            let file_ref = Regex::new(r"(?m)^\t\t([0-9A-F]{24}) /\* (\w+\.swift) \*/ = \{isa = PBXFileReference; lastKnownFileType = sourcecode\.swift; path = (\S+); sourceTree = SOURCE_ROOT; \};$").unwrap();
            let refs: Vec<_> = file_ref.captures_iter(&text).collect();
            assert_eq!(refs.len(), 2);
            assert_eq!(&refs[0][2], "A.swift");
            assert_eq!(&refs[0][3], "Bitkit/Models/A.swift");
            assert_eq!(&refs[1][3], "Bitkit/Views/B.swift");

            let build_file = Regex::new(r"(?m)^\t\t([0-9A-F]{24}) /\* (\w+\.swift) in Sources \*/ = \{isa = PBXBuildFile; fileRef = ([0-9A-F]{24}) ").unwrap();
            let builds: Vec<_> = build_file
                .captures_iter(&text)
                .filter(|c| &c[2] != "BitkitTests.swift")
                .collect();
            assert_eq!(builds.len(), 2);

            for (entity, (file_ref, build)) in outcome.entities.iter().zip(refs.iter().zip(builds.iter())) {
                assert_eq!(&file_ref[1], entity.ref_id.as_str());
                assert_eq!(&build[1], entity.build_id.as_str());
                assert_eq!(&build[3], entity.ref_id.as_str());
                assert_eq!(text.matches(entity.ref_id.as_str()).count(), 2);
                assert_eq!(text.matches(entity.build_id.as_str()).count(), 2);
            }

            let ids: Vec<String> = outcome
                .entities
                .iter()
                .map(|e| e.build_id.to_string())
                .collect();
            assert_eq!(phase_files(&doc, SOURCES_PHASE), ids);
            assert_eq!(
                phase_files(&doc, TESTS_SOURCES_PHASE),
                vec!["96FE1F7B2C2DE6AA006D0C8B"]
            );
        }

        it "keeps existing sections intact" {
            let patch = SourcesPatch::from_config(&config).expect("Failed to build patch");
            pipeline::run(&config.project, &patch, Mode::Write).expect("Run failed");

            let text = fs::read_to_string(&config.project).expect("Failed to read project");
            for line in FIXTURE.lines() {
                assert!(text.contains(line), "lost line {:?}", line);
            }
            assert_eq!(text.matches("/* End PBXFileReference section */").count(), 1);
        }

        it "is a no-op the second time" {
            let patch = SourcesPatch::from_config(&config).expect("Failed to build patch");
            pipeline::run(&config.project, &patch, Mode::Write).expect("First run failed");
            let after_first = digest(&config.project);

            let patch = SourcesPatch::from_config(&config).expect("Failed to build patch");
            let outcome = pipeline::run(&config.project, &patch, Mode::Write).expect("Second run failed");

            assert_eq!(outcome.status, Status::AlreadyApplied);
            assert_eq!(digest(&config.project), after_first);
        }

        it "recognises entries written by an earlier release" {
            let patched = FIXTURE
                .replace(
                    "/* End PBXFileReference section */",
                    "\t\t24481221FE43223860ED2C9F /* A.swift */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.swift; path = Bitkit/Models/A.swift; sourceTree = SOURCE_ROOT; };\n/* End PBXFileReference section */",
                )
                .replace(
                    "/* End PBXBuildFile section */",
                    "\t\tB3A6AD91072F67ECBB485D65 /* A.swift in Sources */ = {isa = PBXBuildFile; fileRef = 24481221FE43223860ED2C9F /* A.swift */; };\n/* End PBXBuildFile section */",
                )
                .replace(
                    "\t\t\tfiles = (\n\t\t\t);\n\t\t\trunOnlyForDeploymentPostprocessing = 0;\n\t\t};\n\t\t96FE1F712C2DE6AA006D0C8B",
                    "\t\t\tfiles = (\n\t\t\t\tB3A6AD91072F67ECBB485D65 /* A.swift in Sources */,\n\t\t\t);\n\t\t\trunOnlyForDeploymentPostprocessing = 0;\n\t\t};\n\t\t96FE1F712C2DE6AA006D0C8B",
                );
            fs::write(&config.project, &patched).expect("Failed to write project");
            let before = digest(&config.project);

            let patch = SourcesPatch::from_config(&config).expect("Failed to build patch");
            assert_eq!(patch.entities()[0].ref_id.as_str(), "24481221FE43223860ED2C9F");
            assert_eq!(patch.entities()[0].build_id.as_str(), "B3A6AD91072F67ECBB485D65");

            let outcome = pipeline::run(&config.project, &patch, Mode::Write).expect("Run failed");

            assert_eq!(outcome.status, Status::AlreadyApplied);
            assert_eq!(digest(&config.project), before);
            let text = fs::read_to_string(&config.project).expect("Failed to read project");
            assert_eq!(text.matches("path = Bitkit/Models/A.swift;").count(), 1);
        }

        it "produces the same ids for the same tree" {
            let first = SourcesPatch::from_config(&config).expect("Failed to build patch");
            let second = SourcesPatch::from_config(&config).expect("Failed to build patch");
            assert_eq!(first.entities(), second.entities());
        }

        it "leaves the file untouched when an anchor is missing" {
            let broken = FIXTURE.replace("/* End PBXBuildFile section */\n", "");
            fs::write(&config.project, &broken).expect("Failed to write project");

            let patch = SourcesPatch::from_config(&config).expect("Failed to build patch");
            let err = pipeline::run(&config.project, &patch, Mode::Write).unwrap_err();

            assert!(format!("{:#}", err).contains("End PBXBuildFile section"));
            assert_eq!(fs::read_to_string(&config.project).unwrap(), broken);
        }

        it "fails when the target does not exist" {
            let mut config = config.clone();
            config.target = "Wallet".to_string();
            let before = digest(&config.project);

            let patch = SourcesPatch::from_config(&config).expect("Failed to build patch");
            assert!(pipeline::run(&config.project, &patch, Mode::Write).is_err());
            assert_eq!(digest(&config.project), before);
        }

        it "does not write in dry run mode" {
            let before = digest(&config.project);
            let patch = SourcesPatch::from_config(&config).expect("Failed to build patch");
            let outcome = pipeline::run(&config.project, &patch, Mode::DryRun).expect("Run failed");

            assert_eq!(outcome.status, Status::DryRun);
            assert_eq!(digest(&config.project), before);
        }

        it "refuses an empty source tree" {
            let mut config = config.clone();
            config.sources.extension = "m".to_string();
            assert!(SourcesPatch::from_config(&config).is_err());
        }
    }
}
