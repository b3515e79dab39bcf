mod helpers;

mod catalog;
mod economy;
mod players;
