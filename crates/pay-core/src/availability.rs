//! # Payment Button Availability
//!
//! Reveals the payment buttons of a page once, at initialization, when the
//! platform reports it can make payments.

use crate::error::PaymentResult;
use tracing::{debug, info};

/// Class marking a payment button as shown
pub const VISIBLE_CLASS: &str = "visible";

/// Class that identifies payment buttons in the page
pub const BUTTON_CLASS: &str = "apple-pay-button";

/// A page element that can carry CSS classes
pub trait ButtonElement {
    fn has_class(&self, class: &str) -> bool;
    fn add_class(&self, class: &str) -> PaymentResult<()>;
}

/// Reveal every button in `buttons` when `available` is true.
///
/// Buttons already carrying [`VISIBLE_CLASS`] are left alone, so each element
/// receives the class at most once. Returns the number of buttons revealed.
pub fn reveal_payment_buttons<E, I>(available: bool, buttons: I) -> PaymentResult<usize>
where
    E: ButtonElement,
    I: IntoIterator<Item = E>,
{
    if !available {
        debug!("Payments unavailable, buttons stay hidden");
        return Ok(0);
    }

    let mut revealed = 0;
    for button in buttons {
        if button.has_class(VISIBLE_CLASS) {
            continue;
        }
        button.add_class(VISIBLE_CLASS)?;
        revealed += 1;
    }

    info!("Revealed {} payment button(s)", revealed);
    Ok(revealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeButton {
        classes: RefCell<Vec<String>>,
    }

    impl FakeButton {
        fn with_classes(classes: &[&str]) -> Self {
            Self {
                classes: RefCell::new(classes.iter().map(|c| c.to_string()).collect()),
            }
        }
    }

    impl ButtonElement for &FakeButton {
        fn has_class(&self, class: &str) -> bool {
            self.classes.borrow().iter().any(|c| c == class)
        }

        fn add_class(&self, class: &str) -> PaymentResult<()> {
            self.classes.borrow_mut().push(class.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_unavailable_reveals_nothing() {
        let buttons = vec![FakeButton::with_classes(&[BUTTON_CLASS]), FakeButton::default()];

        let revealed = reveal_payment_buttons(false, buttons.iter()).unwrap();

        assert_eq!(revealed, 0);
        assert!(buttons.iter().all(|b| !b.has_class(VISIBLE_CLASS)));
    }

    #[test]
    fn test_available_reveals_each_button_once() {
        let buttons = vec![
            FakeButton::with_classes(&[BUTTON_CLASS]),
            FakeButton::with_classes(&[BUTTON_CLASS, VISIBLE_CLASS]),
            FakeButton::with_classes(&[BUTTON_CLASS]),
        ];

        assert_eq!(reveal_payment_buttons(true, buttons.iter()).unwrap(), 2);
        assert_eq!(reveal_payment_buttons(true, buttons.iter()).unwrap(), 0);

        for button in &buttons {
            let count = button
                .classes
                .borrow()
                .iter()
                .filter(|c| c.as_str() == VISIBLE_CLASS)
                .count();
            assert_eq!(count, 1);
        }
    }
}
