use stretch_ik_core::{
    register_stretch_ik, AffectsPolicy, CacheState, Config, NodeRegistry, ParamId, Transform4,
};

fn registry(policy: AffectsPolicy) -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_stretch_ik(
        &mut registry,
        Config {
            affects: policy,
            ..Default::default()
        },
    )
    .expect("register");
    registry
}

#[test]
fn each_input_invalidates_its_declared_outputs() {
    let registry = registry(AffectsPolicy::Literal);
    let expectations = [
        (ParamId::StartTransform, true, true),
        (ParamId::EndTransform, true, true),
        (ParamId::PoleVectorTransform, true, true),
        (ParamId::UpInitLength, true, false),
        (ParamId::DownInitLength, false, true),
        (ParamId::GlobalScale, false, true),
        (ParamId::Stretch, true, true),
        (ParamId::Slide, true, true),
        (ParamId::PoleVecLock, true, true),
    ];
    for (input, up_stale, down_stale) in expectations {
        let mut node = registry.instantiate("stretchIk").expect("node");
        node.get_pair();
        node.invalidate(input.name()).expect("invalidate");

        let state = |stale| if stale { CacheState::Stale } else { CacheState::Fresh };
        assert_eq!(node.cache_state("upScale").unwrap(), state(up_stale), "{input:?}");
        assert_eq!(node.cache_state("downScale").unwrap(), state(down_stale), "{input:?}");
    }
}

#[test]
fn short_names_resolve_like_long_names() {
    let registry = registry(AffectsPolicy::Literal);
    let mut node = registry.instantiate("stretchIk").expect("node");
    node.set_scalar("uil", 5.0).unwrap();
    node.set_scalar("dil", 5.0).unwrap();
    node.set_scalar("gls", 1.0).unwrap();
    node.set_scalar("str", 1.0).unwrap();
    node.set_transform("enm", Transform4::from_translation(20.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(node.get_output("ups").unwrap(), 10.0);
    assert_eq!(node.get_output("dws").unwrap(), 10.0);
}

#[test]
fn literal_declaration_serves_stale_up_scale_after_global_scale_change() {
    let registry = registry(AffectsPolicy::Literal);
    let mut node = registry.instantiate("stretchIk").expect("node");
    node.set_scalar("upInitLength", 5.0).unwrap();
    node.set_scalar("downInitLength", 5.0).unwrap();
    node.set_scalar("globalScale", 1.0).unwrap();
    node.set_scalar("stretch", 1.0).unwrap();
    node.set_transform("endTransform", Transform4::from_translation(20.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(node.get_output("upScale").unwrap(), 10.0);

    node.set_scalar("globalScale", 2.0).unwrap();
    assert_eq!(node.get_output("upScale").unwrap(), 10.0);

    // reading downScale recomputes the pair, which refreshes upScale as well
    assert_eq!(node.get_output("downScale").unwrap(), 5.0);
    assert_eq!(node.get_output("upScale").unwrap(), 5.0);
    assert_eq!(node.compute_count(), 2);
}

#[test]
fn corrected_declaration_refreshes_up_scale_on_global_scale_change() {
    let registry = registry(AffectsPolicy::Corrected);
    let mut node = registry.instantiate("stretchIk").expect("node");
    node.set_scalar("upInitLength", 5.0).unwrap();
    node.set_scalar("downInitLength", 5.0).unwrap();
    node.set_scalar("globalScale", 1.0).unwrap();
    node.set_scalar("stretch", 1.0).unwrap();
    node.set_transform("endTransform", Transform4::from_translation(20.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(node.get_output("upScale").unwrap(), 10.0);

    node.set_scalar("globalScale", 2.0).unwrap();
    assert_eq!(node.get_output("upScale").unwrap(), 5.0);
}

#[test]
fn exported_schema_lists_attribute_metadata() {
    let registry = registry(AffectsPolicy::Literal);
    let registered = registry.get("stretchIk").expect("registered");
    let json = registered.schema.to_json_pretty().expect("export");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    let params = value["params"].as_array().expect("params array");
    let slide = params
        .iter()
        .find(|p| p["name"] == "slide")
        .expect("slide declared");
    assert_eq!(slide["short_name"], "sld");
    assert_eq!(slide["min"], -1.0);
    assert_eq!(slide["max"], 1.0);
    assert_eq!(slide["keyable"], true);
    assert_eq!(slide["default"]["type"], "Scalar");

    let up = params
        .iter()
        .find(|p| p["name"] == "upScale")
        .expect("upScale declared");
    assert_eq!(up["writable"], false);
    assert_eq!(up["default"]["data"], 1.0);
}
