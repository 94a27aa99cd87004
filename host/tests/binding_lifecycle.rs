//! # 绑定生命周期集成测试
//!
//! 测试 CollapsingPage → CollapseEngine → Surface 的完整链路：
//! 激活、逐帧推进、恢复与卸载。

use std::cell::RefCell;
use std::rc::Rc;

use collapse_host::{CollapsingPage, CollapsingPageProps, OVERLAY_CLASS, demo_overlay};
use collapse_runtime::style::{POINTER_EVENTS_ALL, POINTER_EVENTS_NONE};
use collapse_runtime::{
    CollapseEngine, CollapseError, CollapseOptions, FinishEvent, FinishOutcome, NodeId,
    NodeTemplate, StyleRecord, Surface, is_descendant,
};

/// body > main > (div.a > p, div.b), section
fn test_surface() -> (Surface, Vec<NodeId>) {
    let mut surface = Surface::new();
    let body = surface.body();
    let page = NodeTemplate::new("main").children([
        NodeTemplate::new("div")
            .with_class("a")
            .with_height(100.0)
            .child(NodeTemplate::new("p").with_height(40.0)),
        NodeTemplate::new("div").with_class("b").with_height(60.0),
    ]);
    let main = surface.instantiate(body, &page).unwrap();
    let section = surface.append(body, "section").unwrap();
    surface.layout_blocks();

    let mut page_nodes = vec![main, section];
    page_nodes.extend(surface.children(main).iter().copied());
    (surface, page_nodes)
}

fn styles(surface: &Surface) -> Vec<(NodeId, StyleRecord)> {
    surface
        .descendants(surface.document_element())
        .filter_map(|id| surface.style(id).map(|s| (id, s.clone())))
        .collect()
}

fn recording_page(seed: u64) -> (CollapsingPage, Rc<RefCell<Vec<FinishEvent>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let page = CollapsingPage::with_engine(CollapseEngine::seeded(seed), Some(demo_overlay()))
        .with_duration_ms(1000.0)
        .on_finish(move |event| sink.borrow_mut().push(*event));
    (page, events)
}

/// 测试完整的 collapse → finish → restore 流程
#[test]
fn test_full_lifecycle() {
    let (mut surface, page_nodes) = test_surface();
    let before = styles(&surface);
    let (mut page, events) = recording_page(7);

    // 1. 激活：挂载 overlay 并开始折叠
    page.set_collapse(&mut surface, true).unwrap();
    assert!(page.is_active());
    let overlay = page.overlay().unwrap();
    assert_eq!(
        surface.node(overlay).unwrap().class.as_deref(),
        Some(OVERLAY_CLASS)
    );

    let body = surface.body();
    assert_eq!(surface.style(body).unwrap().overflow, "hidden");
    assert_eq!(surface.style(body).unwrap().pointer_events, POINTER_EVENTS_NONE);

    // 2. 页面节点参与动画
    for &node in &page_nodes {
        let style = surface.style(node).unwrap();
        assert!(style.is_animated(), "{node} 应当被动画");
        assert_eq!(style.pointer_events, POINTER_EVENTS_NONE);
    }
    // 非容器、非 body 直接子节点的 p 不受影响
    let a = page_nodes[2];
    let p = surface.children(a)[0];
    assert!(!surface.style(p).unwrap().is_animated());

    // 3. overlay 子树保持可交互且不被动画
    let preserved: Vec<_> = std::iter::once(overlay)
        .chain(surface.descendants(overlay))
        .collect();
    assert_eq!(preserved.len(), 3);
    for node in preserved {
        assert!(is_descendant(&surface, Some(body), Some(node)));
        let style = surface.style(node).unwrap();
        assert!(!style.is_animated());
        if surface.node(node).unwrap().tag == "div" {
            assert_eq!(style.pointer_events, POINTER_EVENTS_ALL);
        }
    }

    // 4. 逐帧推进直到完成
    let mut finish = None;
    for _ in 0..200 {
        if let Some(event) = page.update(16.0) {
            finish = Some(event);
            break;
        }
    }
    let finish = finish.unwrap();
    assert_eq!(finish.animated, page_nodes.len());
    assert_eq!(events.borrow().as_slice(), &[finish]);
    assert_eq!(
        page.completion().unwrap().outcome(),
        Some(FinishOutcome::Finished(finish))
    );

    // 完成后继续推进不会再次触发
    assert!(page.update(1000.0).is_none());
    assert_eq!(events.borrow().len(), 1);

    // 5. 恢复：样式逐字节还原，overlay 卸载
    page.set_collapse(&mut surface, false).unwrap();
    assert!(!page.is_active());
    assert!(!surface.is_attached(overlay));
    assert!(surface.active_session().is_none());
    assert_eq!(styles(&surface), before);
}

/// 测试重复激活是 no-op
#[test]
fn test_repeated_activation_is_noop() {
    let (mut surface, _) = test_surface();
    let (mut page, _) = recording_page(8);

    page.set_collapse(&mut surface, true).unwrap();
    let overlay = page.overlay().unwrap();
    let session = page.engine().session().unwrap().id();
    let body_children = surface.children(surface.body()).len();

    page.set_collapse(&mut surface, true).unwrap();
    assert_eq!(page.overlay(), Some(overlay));
    assert_eq!(page.engine().session().unwrap().id(), session);
    assert_eq!(surface.children(surface.body()).len(), body_children);
}

/// 测试完成前解除绑定会取消回调
#[test]
fn test_teardown_before_finish_cancels() {
    let (mut surface, _) = test_surface();
    let before = styles(&surface);
    let (mut page, events) = recording_page(9);

    page.set_collapse(&mut surface, true).unwrap();
    page.update(1.0);
    let completion = page.completion().unwrap().clone();
    assert!(completion.is_pending());

    let report = page.teardown(&mut surface).unwrap().unwrap();
    assert!(report.cancelled);
    assert!(!report.finished);
    assert_eq!(report.restored, 4);
    assert_eq!(report.preserved, 2);
    assert!(completion.is_cancelled());

    // 之后的推进不会触发回调
    assert!(page.update(10_000.0).is_none());
    assert!(events.borrow().is_empty());
    assert_eq!(styles(&surface), before);

    // 再次解除绑定为 no-op
    assert!(page.teardown(&mut surface).unwrap().is_none());
}

/// 测试通过属性驱动（含 destroy 命名）
#[test]
fn test_apply_props() {
    let (mut surface, _) = test_surface();
    let before = styles(&surface);
    let mut page = CollapsingPage::with_engine(CollapseEngine::seeded(10), None);

    let props: CollapsingPageProps = serde_json::from_str(
        r#"{ "destroy": true, "duration_ms": 400, "content": { "tag": "div", "children": [{ "tag": "h1" }] } }"#,
    )
    .unwrap();
    page.apply_props(&mut surface, props.clone()).unwrap();
    assert!(page.is_active());
    let overlay = page.overlay().unwrap();
    assert_eq!(surface.descendants(overlay).count(), 2);

    let session = page.engine().session().unwrap();
    assert!(session.max_completion_ms() <= 400.0 + 1e-6);
    assert_eq!(session.preserved_nodes().count(), 2);

    page.apply_props(
        &mut surface,
        CollapsingPageProps {
            collapse: false,
            ..props
        },
    )
    .unwrap();
    assert!(!page.is_active());
    assert_eq!(styles(&surface), before);
}

/// 测试激活后再次激活得到新的会话
#[test]
fn test_reactivation_gets_new_session() {
    let (mut surface, _) = test_surface();
    let (mut page, _) = recording_page(11);

    page.set_collapse(&mut surface, true).unwrap();
    let first = page.engine().session().unwrap().id();
    page.set_collapse(&mut surface, false).unwrap();

    page.set_collapse(&mut surface, true).unwrap();
    let second = page.engine().session().unwrap().id();
    assert_ne!(first, second);
    assert!(page.completion().unwrap().is_pending());
}

/// 测试表面被其他引擎持有时激活失败，且不残留 overlay
#[test]
fn test_activation_fails_when_surface_busy() {
    let (mut surface, _) = test_surface();
    let mut other = CollapseEngine::seeded(12);
    other
        .collapse(&mut surface, None, CollapseOptions::new())
        .unwrap();
    let body_children = surface.children(surface.body()).to_vec();

    let (mut page, _) = recording_page(13);
    let err = page.set_collapse(&mut surface, true).unwrap_err();
    assert!(matches!(err, CollapseError::SessionAlreadyActive { .. }));
    assert!(!page.is_active());

    let attached: Vec<_> = surface
        .children(surface.body())
        .iter()
        .copied()
        .filter(|&id| surface.is_attached(id))
        .collect();
    assert_eq!(attached, body_children);

    // 其他引擎恢复后可以正常激活
    other.restore(&mut surface);
    page.set_collapse(&mut surface, true).unwrap();
    assert!(page.is_active());
}
