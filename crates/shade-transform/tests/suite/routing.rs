use pretty_assertions::assert_eq;
use shade_relocation::{RelocatorSet, SimpleRelocator};
use shade_transform::{
    AppendingTransformer, DontIncludeResourceTransformer, EntrySink, MemorySink, ResourceEntry,
    ServiceFileTransformer, TransformError, TransformerContext, TransformerSet,
};

/// Routes entries the way a merge does: the first accepting transformer
/// takes the entry, everything else is copied through.
fn route(
    transformers: &mut TransformerSet,
    relocators: &RelocatorSet,
    entries: &[(&str, &str, &str)],
) -> Result<MemorySink, TransformError> {
    let mut sink = MemorySink::new();
    for &(origin, path, contents) in entries {
        let entry = ResourceEntry {
            path,
            origin,
            contents: contents.as_bytes(),
        };
        let mapped = relocators.map_entry_path(path);
        match transformers.find(&entry) {
            Some(transformer) => transformer.transform(&TransformerContext {
                path: &mapped,
                origin,
                contents: contents.as_bytes(),
                relocators,
            })?,
            None => sink.write_entry(&mapped, contents.as_bytes())?,
        }
    }
    for transformer in transformers.iter_mut() {
        if transformer.has_transformed_resource() {
            transformer.modify_output(&mut sink)?;
        }
    }
    Ok(sink)
}

#[test]
fn first_accepting_transformer_wins() {
    let mut transformers = TransformerSet::new()
        .with(DontIncludeResourceTransformer::new("NOTICE"))
        .with(AppendingTransformer::new("META-INF/NOTICE"));
    assert_eq!(
        transformers.names(),
        vec!["DontIncludeResourceTransformer", "AppendingTransformer"]
    );

    let sink = route(
        &mut transformers,
        &RelocatorSet::new(),
        &[
            ("a.jar", "META-INF/NOTICE", "a"),
            ("b.jar", "META-INF/NOTICE", "b"),
            ("b.jar", "readme.txt", "hello"),
        ],
    )
    .unwrap();

    assert_eq!(sink.paths(), vec!["readme.txt"]);
}

#[test]
fn service_files_merge_under_relocated_names() {
    let relocators =
        RelocatorSet::new().with(SimpleRelocator::new("org.acme", Some("shaded.acme")));
    let mut transformers = TransformerSet::new().with(ServiceFileTransformer::new());

    let sink = route(
        &mut transformers,
        &relocators,
        &[
            ("app", "META-INF/services/org.acme.Plugin", "org.acme.impl.First\n"),
            ("dep.jar", "META-INF/services/org.acme.Plugin", "org.acme.impl.Second"),
            ("dep.jar", "org/acme/impl/First.txt", "x"),
        ],
    )
    .unwrap();

    assert_eq!(
        sink.paths(),
        vec!["shaded/acme/impl/First.txt", "META-INF/services/shaded.acme.Plugin"]
    );
    assert_eq!(
        sink.text("META-INF/services/shaded.acme.Plugin").as_deref(),
        Some("shaded.acme.impl.First\nshaded.acme.impl.Second")
    );
}
