use figment::Jail;

use recipedb_core::config::{Backend, Config, ExpansionSource, QueryText};
use recipedb_core::traits::RetrievalScope;
use recipedb_core::Error;

#[test]
fn defaults_apply_without_any_config_file() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "dev");
        let config = Config::load().map_err(|e| e.to_string())?;
        let s = config.settings();
        assert_eq!(s.embedding.backend, Backend::Bert);
        assert_eq!(s.expansion.source, ExpansionSource::Builtin);
        assert_eq!(s.store.table, "recipes");
        assert_eq!(s.active_profile().threshold, Some(0.65));
        Ok(())
    });
}

#[test]
fn toml_overrides_merge_with_per_backend_defaults() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "dev");
        jail.create_file(
            "config.toml",
            r#"
                [embedding]
                backend = "sentence"

                [ranking.sentence]
                cap = 5
                scope = "catalog"
                query_text = "raw"
            "#,
        )?;
        let config = Config::load().map_err(|e| e.to_string())?;
        let profile = config.settings().active_profile();
        assert_eq!(profile.cap, 5);
        // untouched keys keep the sentence-backend defaults
        assert_eq!(profile.threshold, Some(0.35));
        assert_eq!(profile.embedding_column, "embedding_minilm");
        assert_eq!(profile.scope, RetrievalScope::Catalog);
        assert_eq!(profile.query_text, QueryText::Raw);
        Ok(())
    });
}

#[test]
fn env_overlay_file_and_app_vars_take_precedence() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file("config.toml", "[store]\npath = \"base.db\"\n")?;
        jail.create_file("config.test.toml", "[store]\npath = \"test.db\"\n")?;
        jail.set_env("APP_EMBEDDING__BACKEND", "fake");
        jail.set_env("APP_EMBEDDING__FAKE__DIM", "16");
        let config = Config::load().map_err(|e| e.to_string())?;
        assert_eq!(config.env_name(), "test");
        assert_eq!(config.settings().store.path, "test.db");
        assert_eq!(config.settings().embedding.backend, Backend::Fake);
        assert_eq!(config.settings().embedding.fake.dim, 16);
        assert!(config.resolve_path("test.db").ends_with("test.db"));
        Ok(())
    });
}

#[test]
fn invalid_identifier_is_a_configuration_error() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "dev");
        jail.create_file("config.toml", "[store]\ntable = \"recipes; --\"\n")?;
        match Config::load() {
            Err(Error::Configuration(msg)) => assert!(msg.contains("recipes; --")),
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
        Ok(())
    });
}

#[test]
fn out_of_range_threshold_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "dev");
        jail.create_file("config.toml", "[ranking.bert]\nthreshold = 1.5\n")?;
        assert!(matches!(Config::load(), Err(Error::Configuration(_))));
        Ok(())
    });
}

#[test]
fn zero_embedding_dimensions_are_rejected() {
    for body in [
        "[embedding.remote]\ndim = 0\n",
        "[embedding.fake]\ndim = 0\n",
        "[embedding.sentence]\nmax_len = 0\n",
    ] {
        Jail::expect_with(|jail| {
            jail.set_env("RUST_ENV", "dev");
            jail.create_file("config.toml", body)?;
            match Config::load() {
                Err(Error::Configuration(msg)) => assert!(msg.contains("must be positive"), "{msg}"),
                other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
            }
            Ok(())
        });
    }
}

#[test]
fn sentence_local_model_paths_are_optional() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "dev");
        jail.create_file(
            "config.toml",
            "[embedding.sentence]\nmodel_path = \"model/model.onnx\"\n",
        )?;
        let config = Config::load().map_err(|e| e.to_string())?;
        let sentence = &config.settings().embedding.sentence;
        assert_eq!(sentence.model_path.as_deref(), Some("model/model.onnx"));
        assert_eq!(sentence.tokenizer_dir, None);
        assert_eq!(sentence.model, "all-MiniLM-L6-v2");
        Ok(())
    });
}

#[test]
fn remote_api_key_comes_from_config_or_named_env_var() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "dev");
        jail.set_env("RECIPEDB_TEST_KEY", "sk-env");
        jail.create_file(
            "config.toml",
            "[embedding.remote]\napi_key_env = \"RECIPEDB_TEST_KEY\"\n",
        )?;
        let config = Config::load().map_err(|e| e.to_string())?;
        let remote = &config.settings().embedding.remote;
        assert_eq!(remote.resolve_api_key().map_err(|e| e.to_string())?, "sk-env");

        let mut inline = remote.clone();
        inline.api_key = Some("sk-inline".into());
        assert_eq!(inline.resolve_api_key().map_err(|e| e.to_string())?, "sk-inline");

        let mut missing = remote.clone();
        missing.api_key_env = "RECIPEDB_TEST_KEY_UNSET".into();
        assert!(matches!(missing.resolve_api_key(), Err(Error::Configuration(_))));
        Ok(())
    });
}

#[test]
fn load_from_reads_an_explicit_directory() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(tmp.path().join("config.toml"), "[store]\ndictionary_table = \"dict\"\n").unwrap();
    let config = Config::load_from(tmp.path()).expect("load");
    assert_eq!(config.settings().store.dictionary_table, "dict");
    assert_eq!(config.resolve_path("recipes.db"), tmp.path().join("recipes.db"));
}

#[test]
fn only_store_and_backend_errors_are_recoverable() {
    assert!(Error::Store("down".into()).is_recoverable());
    assert!(Error::EmbeddingBackend("502".into()).is_recoverable());
    assert!(!Error::Configuration("x".into()).is_recoverable());
    assert!(!Error::DimensionMismatch { id: 1, expected: 3, got: 4 }.is_recoverable());
    assert!(!Error::CorruptVector("7 bytes".into()).is_recoverable());
}
