mod helpers;
mod lookup;
mod pages;
