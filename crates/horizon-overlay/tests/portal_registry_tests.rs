//! Integration tests for the portal registry, portals and the portal provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use horizon_overlay::geometry::{BoundingRect, CssPosition, Rect, Viewport};
use horizon_overlay::{
    Portal, PortalChange, PortalChangeKind, PortalError, PortalId, PortalItem, PortalProvider, PortalRegistry, fragment,
};
use parking_lot::Mutex;

const VIEWPORT: Viewport = Viewport::new(800.0, 600.0);

fn measured(x: f64, y: f64, w: f64, h: f64) -> BoundingRect {
    BoundingRect::new(Rect::new(x, y, w, h), VIEWPORT)
}

fn change_counter(registry: &PortalRegistry) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    registry.on_change().connect(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    count
}

#[test]
fn test_add_is_idempotent() {
    let registry = PortalRegistry::new();
    let changes = change_counter(&registry);
    let item = PortalItem::new(PortalId::new()).with_fragment(fragment("a"));

    assert!(registry.add(&item));
    assert!(!registry.add(&item.clone().with_fragment(fragment("b"))));

    assert_eq!(registry.len(), 1);
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    let stored = registry.get_item(item.id).unwrap();
    assert_eq!(stored.fragment.map(|f| f()), Some("a".to_string()));
}

#[test]
fn test_update_requires_prior_add() {
    let registry = PortalRegistry::new();
    let changes = change_counter(&registry);
    let item = PortalItem::new(PortalId::new());

    assert_eq!(registry.update(&item), Err(PortalError::ItemNotFound(item.id)));
    assert!(registry.is_empty());
    assert!(registry.get_item(item.id).is_none());
    assert_eq!(changes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_remove_notifies_once() {
    let registry = PortalRegistry::new();
    let changes = change_counter(&registry);
    let item = PortalItem::new(PortalId::new());
    let other = PortalItem::new(PortalId::new());
    registry.add(&item);
    registry.add(&other);

    assert!(registry.remove(item.id));
    assert!(!registry.remove(item.id));
    assert_eq!(changes.load(Ordering::SeqCst), 3);

    assert!(!registry.remove(PortalId::new()));
    assert_eq!(changes.load(Ordering::SeqCst), 3);
}

#[test]
fn test_update_stores_a_copy() {
    let registry = PortalRegistry::new();
    let mut item = PortalItem::new(PortalId::new());
    registry.add(&item);

    item.anchor_rect = Some(measured(1.0, 2.0, 3.0, 4.0));
    registry.update(&item).unwrap();

    item.anchor_rect = Some(measured(9.0, 9.0, 9.0, 9.0));
    assert_eq!(registry.get_item(item.id).unwrap().anchor_rect, Some(measured(1.0, 2.0, 3.0, 4.0)));

    let mut snapshot = registry.items();
    snapshot.clear();
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_subscribers_may_reenter() {
    let registry = Arc::new(PortalRegistry::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let inner = registry.clone();
    let log = seen.clone();
    registry.on_change().connect(move |change: &PortalChange| {
        log.lock().push((change.kind, inner.len(), inner.get_item(change.id).is_some()));
    });

    let item = PortalItem::new(PortalId::new());
    registry.add(&item);
    registry.update(&item).unwrap();
    registry.remove(item.id);

    assert_eq!(
        *seen.lock(),
        vec![
            (PortalChangeKind::Added, 1, true),
            (PortalChangeKind::Updated, 1, true),
            (PortalChangeKind::Removed, 0, false),
        ]
    );
}

#[test]
fn test_concurrent_adds_and_removes() {
    let registry = Arc::new(PortalRegistry::new());
    let changes = change_counter(&registry);

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    let item = PortalItem::new(PortalId::new());
                    assert!(registry.add(&item));
                    registry.update(&item).unwrap();
                    assert!(registry.remove(item.id));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(registry.is_empty());
    assert_eq!(changes.load(Ordering::SeqCst), 8 * 100 * 3);
}

#[test]
fn test_portal_show_reposition_hide() {
    let registry = Arc::new(PortalRegistry::new());
    let mut portal = Portal::new(registry.clone(), fragment("<ul/>"));
    assert!(!portal.is_visible());
    assert_eq!(portal.reposition(None, None), Ok(false));

    // Fragment hangs off the bottom of the window.
    let anchor = measured(100.0, 100.0, 50.0, 20.0);
    let fragment_rect = measured(100.0, 650.0, 50.0, 50.0);
    portal.show(Some(anchor), Some(fragment_rect), false).unwrap();
    assert!(portal.is_visible());

    let stored = registry.get_item(portal.id()).unwrap();
    assert_eq!(stored.css_position, CssPosition::Absolute);
    assert!(stored.anchor_rect.unwrap().top < anchor.top);
    assert!(!stored.fragment_rect.unwrap().is_outside_bottom());

    // After a resize everything fits; no correction.
    let fits = measured(100.0, 130.0, 50.0, 50.0);
    assert_eq!(portal.reposition(Some(anchor), Some(fits)), Ok(true));
    assert_eq!(registry.get_item(portal.id()).unwrap().anchor_rect, Some(anchor));

    assert!(portal.hide());
    assert!(!portal.hide());
    assert!(registry.is_empty());
}

#[test]
fn test_portal_unmeasured_show_and_drop() {
    let registry = Arc::new(PortalRegistry::new());
    let changes = change_counter(&registry);
    {
        let mut portal = Portal::new(registry.clone(), fragment("tip"));
        portal.show(None, None, true).unwrap();
        portal.show(None, None, true).unwrap();
        let stored = registry.get_item(portal.id()).unwrap();
        assert_eq!(stored.css_position, CssPosition::Fixed);
        assert!(stored.anchor_rect.is_none());
    }
    assert!(registry.is_empty());
    assert_eq!(changes.load(Ordering::SeqCst), 3);
}

#[test]
fn test_provider_renders_items() {
    let registry = Arc::new(PortalRegistry::new());
    let provider = PortalProvider::new(registry.clone());
    let renders = Arc::new(AtomicUsize::new(0));
    let counter = renders.clone();
    provider.render_requested().connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(provider.render(), "");
    assert!(!provider.needs_render());

    let mut portal = Portal::new(registry.clone(), fragment("<i>hi</i>"));
    portal.show(Some(measured(10.0, 20.0, 30.0, 40.0)), Some(measured(10.0, 60.0, 30.0, 40.0)), true).unwrap();
    assert!(provider.needs_render());
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    assert_eq!(
        provider.render(),
        format!(
            r#"<div id="portal-{}" style="position:fixed;top:20px;left:10px;width:30px;height:40px;"><i>hi</i></div>"#,
            portal.id()
        )
    );

    drop(portal);
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(provider.render(), "");
}

#[test]
fn test_dispose_clears_registry() {
    let registry = Arc::new(PortalRegistry::new());
    let mut portal = Portal::new(registry.clone(), fragment("x"));
    portal.show(None, None, false).unwrap();

    registry.dispose();
    assert!(registry.is_empty());
    assert_eq!(portal.reposition(None, None), Err(PortalError::Disposed));
    assert!(!portal.hide());
}

#[test]
fn test_show_on_disposed_registry_stays_hidden() {
    let registry = Arc::new(PortalRegistry::new());
    registry.dispose();

    let mut portal = Portal::new(registry.clone(), fragment("late"));
    assert_eq!(portal.show(None, None, false), Err(PortalError::Disposed));
    assert!(!portal.is_visible());
    assert!(registry.is_empty());
    assert_eq!(portal.reposition(None, None), Ok(false));
}
