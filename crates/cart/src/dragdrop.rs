//! Drag gesture handling for the cart.
//!
//! The shell forwards pointer-layer drag events here as abstract payloads;
//! this controller turns completed gestures into cart mutations. One
//! controller is bound per page. When the product grid re-renders, the
//! shell calls [`DragDropController::rebind`], which resets gesture state -
//! the old handlers are replaced, never stacked, so a drop fires exactly
//! one mutation.

use std::sync::Arc;

use cacao_core::{Price, ProductId};

use crate::notify::{Notifier, Severity};
use crate::store::CartStore;
use crate::sync::{CartTransport, SyncClient};

/// What a drag gesture is carrying.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPayload {
    /// A product card picked up from the grid.
    Product {
        id: ProductId,
        name: String,
        unit_price: Price,
        stock: u32,
    },
    /// An existing cart line picked up from the cart box.
    CartItem { id: ProductId },
}

/// Gesture state for the one in-flight drag.
#[derive(Debug, Clone, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    Dragging(DragPayload),
}

/// What a completed drop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Product landed in the cart.
    Added,
    /// Cart line was dragged out and removed; a resync pass ran.
    Removed,
    /// Nothing happened (no active gesture, out of stock, max stock).
    Ignored,
}

/// Translates drag gestures into cart mutations.
pub struct DragDropController {
    gesture: Gesture,
    notifier: Arc<dyn Notifier>,
}

impl DragDropController {
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gesture: Gesture::Idle,
            notifier,
        }
    }

    /// Reset gesture state after a grid re-render.
    pub fn rebind(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// A drag began over a product card or a cart line.
    pub fn drag_start(&mut self, payload: DragPayload) {
        self.gesture = Gesture::Dragging(payload);
    }

    /// The drag ended without a drop.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Whether a gesture is currently in flight.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging(_))
    }

    /// The gesture ended over the cart zone.
    ///
    /// Only product payloads land here; an out-of-stock product is refused
    /// without touching the cart. Dropping a cart line back onto the cart
    /// ends the gesture with no mutation.
    pub fn drop_on_cart(&mut self, store: &mut CartStore) -> DropOutcome {
        let gesture = std::mem::take(&mut self.gesture);
        let Gesture::Dragging(DragPayload::Product {
            id,
            name,
            unit_price,
            stock,
        }) = gesture
        else {
            return DropOutcome::Ignored;
        };

        if stock == 0 {
            self.notifier
                .notify("This item is out of stock", Severity::Error);
            return DropOutcome::Ignored;
        }

        match store.add_item(id, &name, unit_price, stock) {
            Ok(()) => DropOutcome::Added,
            Err(_) => DropOutcome::Ignored,
        }
    }

    /// The gesture ended outside the cart zone.
    ///
    /// Dragging a cart line out removes it entirely, then runs one
    /// immediate reconciliation pass so the server-side cart does not
    /// drift from a removal made purely client-side.
    pub async fn drop_outside<T: CartTransport>(
        &mut self,
        store: &mut CartStore,
        sync: &SyncClient<T>,
    ) -> DropOutcome {
        let gesture = std::mem::take(&mut self.gesture);
        let Gesture::Dragging(DragPayload::CartItem { id }) = gesture else {
            return DropOutcome::Ignored;
        };

        if store.remove_item(&id, true) {
            self.notifier.notify("Removed from cart", Severity::Success);
            sync.resync(store.items()).await;
            DropOutcome::Removed
        } else {
            DropOutcome::Ignored
        }
    }
}
