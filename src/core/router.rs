use crate::schema::channel::Channel;
use crate::schema::event::RawEvent;

/// Classify an event into exactly one channel.
///
/// First match wins: lethal, then counter/support, then any non-connecting
/// result, else impact. Lethality outranks everything, including a miss.
pub fn route(event: &RawEvent) -> Channel {
    if event.is_lethal {
        Channel::Fatal
    } else if event.is_counter || event.is_support {
        Channel::Special
    } else if !event.attack_result.connects() {
        Channel::Evade
    } else {
        Channel::Impact
    }
}
