mod basis;
mod quadrature;
