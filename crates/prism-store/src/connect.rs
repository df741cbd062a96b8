#![forbid(unsafe_code)]

//! Binding UI components to store slices.
//!
//! [`Connected<C>`] wraps a [`Component`] instance together with a
//! [`Scheme`]. Construction subscribes it to the store, computes its data
//! slice synchronously, and performs the initial render, so the first render
//! already sees correct data. From then on:
//!
//! - a store change that touches the scheme's paths re-extracts the slice
//!   and forces a render;
//! - [`set_props`](Connected::set_props) re-derives the slice synchronously
//!   when the scheme is dynamic, and skips the render when the new
//!   properties are shallow-equal to the previous ones;
//! - [`unmount`](Connected::unmount) (or drop) removes the subscription;
//! - a render may write back to the store. If the resulting notification
//!   pass reaches the component that is still rendering, its slice updates
//!   but the nested render is skipped.
//!
//! The rendered properties are the union of the incoming properties and the
//! data slice; slice keys win on collision.
//!
//! # Entry points
//!
//! The wrapping surface is three explicit constructors instead of one
//! shape-sniffing call:
//!
//! - [`Store::connect`] — default scheme `{*: *}` (whole snapshot,
//!   flattened);
//! - [`Store::connect_with`] — explicit scheme;
//! - [`Store::connector`] — a reusable [`Connector`] that applies one scheme
//!   to many component instances.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::Store;
use crate::props::Props;
use crate::registry::SubscriptionId;
use crate::scheme::Scheme;

/// The external UI framework seam: anything that can be rendered with a set
/// of properties.
pub trait Component {
    fn render(&mut self, props: &Props);
}

/// Shared mutable state between a [`Connected`] handle and its store
/// callback.
struct Mounted<C: Component> {
    /// `None` only while this component's own render is in flight.
    component: Option<C>,
    slice: Props,
}

/// Take the component out of its cell, render with the merged view, and put
/// it back. No borrow is held while `render` runs, so a render may re-enter
/// the store; if the resulting pass reaches this same component, the slice
/// still updates but the nested render is skipped.
fn render_now<C: Component>(mounted: &RefCell<Mounted<C>>, incoming: &RefCell<Props>) {
    let (mut component, merged) = {
        let mut state = mounted.borrow_mut();
        let Some(component) = state.component.take() else {
            return;
        };
        let merged = incoming.borrow().merged(&state.slice);
        (component, merged)
    };
    component.render(&merged);
    mounted.borrow_mut().component = Some(component);
}

/// A component instance bound to a store through a scheme.
///
/// Dropping a `Connected` unsubscribes it, mirroring unmount.
pub struct Connected<C: Component + 'static> {
    store: Store,
    scheme: Scheme,
    props: Rc<RefCell<Props>>,
    mounted: Rc<RefCell<Mounted<C>>>,
    subscription: Option<SubscriptionId>,
}

impl<C: Component + 'static> Connected<C> {
    fn mount(store: &Store, component: C, scheme: Scheme, initial_props: Props) -> Self {
        let props = Rc::new(RefCell::new(initial_props));
        let slice = store.extract(&scheme.resolve(&props.borrow()));
        let mounted = Rc::new(RefCell::new(Mounted {
            component: Some(component),
            slice,
        }));

        // The callback holds the mounted state weakly: a dropped component
        // must never be rendered, even if the registry entry outlives it
        // for the remainder of a pass.
        let weak = Rc::downgrade(&mounted);
        let callback_props = Rc::clone(&props);
        let subscription = store.subscribe(scheme.clone(), Rc::clone(&props), move |subset| {
            if let Some(mounted) = weak.upgrade() {
                mounted.borrow_mut().slice = subset;
                render_now(&mounted, &callback_props);
            }
        });

        let mut connected = Self {
            store: store.clone(),
            scheme,
            props,
            mounted,
            subscription: Some(subscription),
        };
        connected.force_render();
        connected
    }

    /// Replace the incoming properties.
    ///
    /// A dynamic scheme is re-resolved against the new properties
    /// immediately, without waiting for a store change. The render is
    /// skipped when the new properties are shallow-equal to the old ones.
    pub fn set_props(&mut self, next: Props) {
        let suppress = self.props.borrow().shallow_eq(&next);
        *self.props.borrow_mut() = next;
        if self.scheme.is_dynamic() {
            let resolved = self.scheme.resolve(&self.props.borrow());
            self.mounted.borrow_mut().slice = self.store.extract(&resolved);
        }
        if !suppress {
            self.force_render();
        }
    }

    /// Render unconditionally with the current merged properties.
    pub fn force_render(&mut self) {
        render_now(&self.mounted, &self.props);
    }

    /// Remove the subscription. Idempotent, and safe even if called during
    /// a notification pass.
    pub fn unmount(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
        }
    }

    /// The merged view the component would render with right now.
    #[must_use]
    pub fn current_props(&self) -> Props {
        self.props.borrow().merged(&self.mounted.borrow().slice)
    }

    /// Inspect the wrapped component. `None` while its own render is in
    /// flight.
    pub fn with_component<R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        self.mounted.borrow().component.as_ref().map(f)
    }
}

impl<C: Component + 'static> Drop for Connected<C> {
    fn drop(&mut self) {
        self.unmount();
    }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// A reusable scheme wrapper: the decorator form of connecting.
#[derive(Clone)]
pub struct Connector {
    store: Store,
    scheme: Scheme,
}

impl Connector {
    /// Connect a component instance with this connector's scheme.
    pub fn wrap<C: Component + 'static>(&self, component: C) -> Connected<C> {
        Connected::mount(&self.store, component, self.scheme.clone(), Props::new())
    }

    /// Connect a component instance with initial incoming properties.
    pub fn wrap_with<C: Component + 'static>(
        &self,
        component: C,
        props: Props,
    ) -> Connected<C> {
        Connected::mount(&self.store, component, self.scheme.clone(), props)
    }
}

impl Store {
    /// Connect a component with the default scheme `{*: *}`.
    pub fn connect<C: Component + 'static>(&self, component: C) -> Connected<C> {
        Connected::mount(self, component, Scheme::whole_store(), Props::new())
    }

    /// Connect a component with an explicit scheme.
    pub fn connect_with<C: Component + 'static>(
        &self,
        component: C,
        scheme: impl Into<Scheme>,
    ) -> Connected<C> {
        Connected::mount(self, component, scheme.into(), Props::new())
    }

    /// Connect a component with an explicit scheme and initial properties.
    pub fn connect_with_props<C: Component + 'static>(
        &self,
        component: C,
        scheme: impl Into<Scheme>,
        props: Props,
    ) -> Connected<C> {
        Connected::mount(self, component, scheme.into(), props)
    }

    /// Build a reusable [`Connector`] for a scheme.
    #[must_use]
    pub fn connector(&self, scheme: impl Into<Scheme>) -> Connector {
        Connector {
            store: self.clone(),
            scheme: scheme.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
